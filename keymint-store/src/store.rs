//! The `LicenseStore` handle and row-level operations.
//!
//! Row operations take a plain `&Connection` so they compose inside a
//! `with_txn` scope (a `Transaction` derefs to `Connection`) as well as in
//! standalone reads.

use crate::error::{StoreError, StoreResult};
use crate::record::LicenseRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use keymint_types::{HardwareId, LicenseCode, SessionToken};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Persistent store for license records backed by SQLite.
#[derive(Clone)]
pub struct LicenseStore {
    conn: Arc<Mutex<Connection>>,
}

impl LicenseStore {
    /// Opens (or creates) a license store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Storage(format!("failed to open license store: {e}")))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory license store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            StoreError::Storage(format!("failed to open in-memory license store: {e}"))
        })?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS licenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                license_code TEXT NOT NULL UNIQUE,
                bound_hwid TEXT,
                activated_at TEXT,
                session_token TEXT UNIQUE,
                expires_at TEXT,
                buyer_email TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_licenses_buyer ON licenses(buyer_email);
            ",
        )
        .map_err(|e| StoreError::Storage(format!("failed to init license schema: {e}")))?;
        Ok(())
    }

    /// Runs `f` inside one exclusive (`BEGIN IMMEDIATE`) transaction.
    ///
    /// This is the select-for-update primitive: while `f` runs, no other
    /// operation can read-then-claim the same record or the pool of
    /// available records. If `f` returns an error the transaction is
    /// dropped without commit and every write in it rolls back.
    pub fn with_txn<T, E>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| E::from(StoreError::from(e)))?;
        let out = f(&tx)?;
        tx.commit().map_err(|e| E::from(StoreError::from(e)))?;
        Ok(out)
    }

    /// Reads a record by code outside any transaction.
    pub fn get_by_code(&self, code: &LicenseCode) -> StoreResult<Option<LicenseRecord>> {
        let conn = self.conn.lock().unwrap();
        find_by_code(&conn, code)
    }

    /// Returns the total number of license records.
    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM licenses", [], |row| row.get(0))
            .map_err(|e| StoreError::Storage(format!("failed to count licenses: {e}")))?;
        Ok(count as usize)
    }

    /// Returns the number of available (unowned) records.
    pub fn count_available(&self) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM licenses WHERE buyer_email IS NULL",
                [],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Storage(format!("failed to count available: {e}")))?;
        Ok(count as usize)
    }
}

// ── Row operations ───────────────────────────────────────────

const RECORD_COLUMNS: &str =
    "id, license_code, bound_hwid, activated_at, session_token, expires_at, buyer_email";

/// Finds a record by its license code.
pub fn find_by_code(
    conn: &Connection,
    code: &LicenseCode,
) -> StoreResult<Option<LicenseRecord>> {
    let raw = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM licenses WHERE license_code = ?1"),
            params![code.as_str()],
            read_raw_row,
        )
        .optional()
        .map_err(|e| StoreError::Storage(format!("failed to query license by code: {e}")))?;
    raw.map(decode_record).transpose()
}

/// Finds one available (unowned) record, lowest id first.
///
/// Must be called inside a `with_txn` scope when the caller intends to
/// claim the record.
pub fn find_available(conn: &Connection) -> StoreResult<Option<LicenseRecord>> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM licenses
                 WHERE buyer_email IS NULL ORDER BY id LIMIT 1"
            ),
            [],
            read_raw_row,
        )
        .optional()
        .map_err(|e| StoreError::Storage(format!("failed to query available license: {e}")))?;
    raw.map(decode_record).transpose()
}

/// Finds the buyer's record with the latest expiration.
///
/// Records with an expiration sort before never-activated ones; ties on
/// the expiration instant break toward the highest id. RFC 3339 columns
/// are fixed-width UTC strings, so lexicographic order is chronological.
pub fn latest_for_buyer(
    conn: &Connection,
    buyer_email: &str,
) -> StoreResult<Option<LicenseRecord>> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM licenses
                 WHERE buyer_email = ?1
                 ORDER BY (expires_at IS NULL), expires_at DESC, id DESC
                 LIMIT 1"
            ),
            params![buyer_email],
            read_raw_row,
        )
        .optional()
        .map_err(|e| StoreError::Storage(format!("failed to query buyer licenses: {e}")))?;
    raw.map(decode_record).transpose()
}

/// Inserts a new record with the given code, optionally already owned.
///
/// All other fields start unset (virgin). Returns the stored record with
/// its assigned id.
pub fn insert_record(
    conn: &Connection,
    code: &LicenseCode,
    buyer_email: Option<&str>,
) -> StoreResult<LicenseRecord> {
    conn.execute(
        "INSERT INTO licenses (license_code, buyer_email) VALUES (?1, ?2)",
        params![code.as_str(), buyer_email],
    )
    .map_err(|e| StoreError::Storage(format!("failed to insert license: {e}")))?;
    Ok(LicenseRecord {
        id: conn.last_insert_rowid(),
        license_code: code.clone(),
        bound_hwid: None,
        activated_at: None,
        session_token: None,
        expires_at: None,
        buyer_email: buyer_email.map(String::from),
    })
}

/// Writes a record's mutable fields back by id.
///
/// `license_code` and `id` are immutable and never updated.
pub fn update_record(conn: &Connection, record: &LicenseRecord) -> StoreResult<()> {
    let updated = conn
        .execute(
            "UPDATE licenses
             SET bound_hwid = ?1, activated_at = ?2, session_token = ?3,
                 expires_at = ?4, buyer_email = ?5
             WHERE id = ?6",
            params![
                record.bound_hwid.as_ref().map(|h| h.as_str()),
                record.activated_at.as_ref().map(encode_ts),
                record.session_token.as_ref().map(|t| t.as_str()),
                record.expires_at.as_ref().map(encode_ts),
                record.buyer_email,
                record.id,
            ],
        )
        .map_err(|e| StoreError::Storage(format!("failed to update license: {e}")))?;
    if updated != 1 {
        return Err(StoreError::Storage(format!(
            "update matched no license row (id {})",
            record.id
        )));
    }
    Ok(())
}

// ── Row decoding ─────────────────────────────────────────────

type RawRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn read_raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn decode_record(raw: RawRow) -> StoreResult<LicenseRecord> {
    let (id, code, hwid, activated_at, token, expires_at, buyer_email) = raw;
    let license_code = LicenseCode::parse(&code)
        .map_err(|e| StoreError::Corrupt(format!("row {id}: {e}")))?;
    let bound_hwid = hwid
        .map(|h| HardwareId::parse(&h))
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("row {id}: {e}")))?;
    Ok(LicenseRecord {
        id,
        license_code,
        bound_hwid,
        activated_at: activated_at.map(|s| decode_ts(id, &s)).transpose()?,
        session_token: token.map(SessionToken::from_string),
        expires_at: expires_at.map(|s| decode_ts(id, &s)).transpose()?,
        buyer_email,
    })
}

/// Encodes a UTC instant as fixed-width RFC 3339 (`…Z`, nanoseconds).
///
/// Fixed width keeps lexicographic and chronological order identical,
/// which `latest_for_buyer` relies on; nanosecond precision makes the
/// round-trip through the store lossless.
fn encode_ts(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_ts(id: i64, s: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("row {id}: bad timestamp {s:?}: {e}")))
}
