//! SQLite storage layer for keymint license records.
//!
//! One table, one row per sellable activation right. The store exposes an
//! exclusive-transaction combinator (`LicenseStore::with_txn`) that the
//! domain crates use for every mutating operation: the transaction opens
//! `BEGIN IMMEDIATE` under the connection mutex, so two operations that
//! could touch the same record (or compete for the pool of available
//! records) never interleave, and dropping without commit rolls back every
//! partial write.

mod error;
mod record;
mod store;

pub use error::{StoreError, StoreResult};
pub use record::LicenseRecord;
pub use store::{
    find_available, find_by_code, insert_record, latest_for_buyer, update_record, LicenseStore,
};
