use chrono::{Duration, Utc};
use keymint_store::{
    find_available, insert_record, latest_for_buyer, update_record, LicenseStore,
    StoreError,
};
use keymint_types::{HardwareId, LicenseCode, SessionToken};
use pretty_assertions::assert_eq;

#[test]
fn insert_and_find_by_code() {
    let store = LicenseStore::open_in_memory().unwrap();
    let code = LicenseCode::generate();

    let inserted = store
        .with_txn(|conn| insert_record(conn, &code, None))
        .unwrap();
    assert!(inserted.is_available());
    assert!(inserted.is_virgin());

    let found = store.get_by_code(&code).unwrap().unwrap();
    assert_eq!(found, inserted);
    assert!(store.get_by_code(&LicenseCode::generate()).unwrap().is_none());
}

#[test]
fn duplicate_code_rejected_by_unique_constraint() {
    let store = LicenseStore::open_in_memory().unwrap();
    let code = LicenseCode::generate();
    store
        .with_txn(|conn| insert_record(conn, &code, None))
        .unwrap();

    let dup: Result<_, StoreError> = store.with_txn(|conn| insert_record(conn, &code, None));
    assert!(dup.is_err());
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn find_available_skips_owned_records() {
    let store = LicenseStore::open_in_memory().unwrap();
    let owned = LicenseCode::generate();
    let free = LicenseCode::generate();
    store
        .with_txn(|conn| {
            insert_record(conn, &owned, Some("alice@example.com"))?;
            insert_record(conn, &free, None)
        })
        .unwrap();

    let candidate = store
        .with_txn(|conn| find_available(conn))
        .unwrap()
        .unwrap();
    assert_eq!(candidate.license_code, free);
    assert_eq!(store.count_available().unwrap(), 1);
}

#[test]
fn update_persists_all_mutable_fields() {
    let store = LicenseStore::open_in_memory().unwrap();
    let code = LicenseCode::generate();
    let mut record = store
        .with_txn(|conn| insert_record(conn, &code, Some("bob@example.com")))
        .unwrap();

    let now = Utc::now();
    record.bound_hwid = Some(HardwareId::parse("machine-77").unwrap());
    record.activated_at = Some(now);
    record.session_token = Some(SessionToken::generate());
    record.expires_at = Some(now + Duration::days(365));

    store
        .with_txn(|conn| update_record(conn, &record))
        .unwrap();

    let reloaded = store.get_by_code(&code).unwrap().unwrap();
    assert_eq!(reloaded, record);
}

#[test]
fn latest_for_buyer_prefers_latest_expiry_then_highest_id() {
    let store = LicenseStore::open_in_memory().unwrap();
    let now = Utc::now();

    let codes: Vec<LicenseCode> = (0..3).map(|_| LicenseCode::generate()).collect();
    store
        .with_txn(|conn| {
            // Never-activated record sorts last.
            insert_record(conn, &codes[0], Some("carol@example.com"))?;

            let mut near = insert_record(conn, &codes[1], Some("carol@example.com"))?;
            near.expires_at = Some(now + Duration::days(10));
            update_record(conn, &near)?;

            let mut far = insert_record(conn, &codes[2], Some("carol@example.com"))?;
            far.expires_at = Some(now + Duration::days(300));
            update_record(conn, &far)?;
            Ok::<_, StoreError>(())
        })
        .unwrap();

    let latest = store
        .with_txn(|conn| latest_for_buyer(conn, "carol@example.com"))
        .unwrap()
        .unwrap();
    assert_eq!(latest.license_code, codes[2]);

    assert!(store
        .with_txn(|conn| latest_for_buyer(conn, "nobody@example.com"))
        .unwrap()
        .is_none());
}

#[test]
fn failed_txn_rolls_back_every_write() {
    let store = LicenseStore::open_in_memory().unwrap();
    let code = LicenseCode::generate();

    let result: Result<(), StoreError> = store.with_txn(|conn| {
        insert_record(conn, &code, None)?;
        Err(StoreError::Storage("boom".to_string()))
    });
    assert!(result.is_err());
    assert_eq!(store.count().unwrap(), 0);
    assert!(store.get_by_code(&code).unwrap().is_none());
}

#[test]
fn on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("licenses.db");
    let code = LicenseCode::generate();

    {
        let store = LicenseStore::open(&path).unwrap();
        store
            .with_txn(|conn| insert_record(conn, &code, Some("dave@example.com")))
            .unwrap();
    }

    let store = LicenseStore::open(&path).unwrap();
    let record = store.get_by_code(&code).unwrap().unwrap();
    assert_eq!(record.buyer_email.as_deref(), Some("dave@example.com"));
}
