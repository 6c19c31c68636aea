mod common;

use common::mem_store;
use keymint_license::{allocate_for_buyer, LicenseError, LicenseService, LogNotifier};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[test]
fn assigns_available_stock_before_minting() {
    let store = mem_store();
    let service = LicenseService::new(store.clone(), Arc::new(LogNotifier));
    let provisioned = service.provision(3).unwrap();

    let fulfillment = service.allocate("first@example.com").unwrap();
    assert!(provisioned.contains(&fulfillment.license_code));
    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(store.count_available().unwrap(), 2);
}

#[test]
fn mints_when_pool_is_empty() {
    let store = mem_store();
    let service = LicenseService::new(store.clone(), Arc::new(LogNotifier));

    let fulfillment = service.allocate("solo@example.com").unwrap();
    assert_eq!(store.count().unwrap(), 1);

    let record = store.get_by_code(&fulfillment.license_code).unwrap().unwrap();
    assert_eq!(record.buyer_email.as_deref(), Some("solo@example.com"));
    assert!(record.is_virgin());
}

#[test]
fn codes_never_collide_across_many_allocations() {
    let store = mem_store();
    let mut codes = HashSet::new();
    for i in 0..200 {
        let record = store
            .with_txn(|conn| allocate_for_buyer(conn, &format!("buyer{i}@example.com")))
            .unwrap();
        assert!(codes.insert(record.license_code));
    }
    assert_eq!(store.count().unwrap(), 200);
}

#[test]
fn concurrent_buyers_each_get_a_distinct_record() {
    let store = mem_store();
    let service = LicenseService::new(store.clone(), Arc::new(LogNotifier));
    service.provision(8).unwrap();

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let service = service.clone();
            thread::spawn(move || {
                service
                    .allocate(&format!("racer{i}@example.com"))
                    .unwrap()
                    .license_code
            })
        })
        .collect();

    let codes: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(codes.len(), 5, "two buyers received the same code");

    // Five of the eight pre-provisioned records claimed, none minted.
    assert_eq!(store.count().unwrap(), 8);
    assert_eq!(store.count_available().unwrap(), 3);
}

#[test]
fn empty_buyer_rejected_without_store_access() {
    let store = mem_store();
    let service = LicenseService::new(store.clone(), Arc::new(LogNotifier));
    let err = service.allocate("   ").unwrap_err();
    assert!(matches!(err, LicenseError::Validation(_)));
    assert_eq!(store.count().unwrap(), 0);
}
