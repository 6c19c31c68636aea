//! Key allocation: exactly one license code per purchase.

use crate::error::LicenseResult;
use keymint_store::{find_available, insert_record, update_record, LicenseRecord};
use keymint_types::LicenseCode;
use rusqlite::Connection;
use tracing::{debug, info};

/// Assigns an available record to the buyer, or mints a new one.
///
/// Must run inside a `LicenseStore::with_txn` scope: the exclusive
/// transaction is what guarantees that at most one purchase can hold a
/// candidate available record at a time, so two concurrent buyers never
/// receive the same previously-unowned code. On any error the caller's
/// transaction rolls back and no assignment becomes visible.
pub fn allocate_for_buyer(conn: &Connection, buyer_email: &str) -> LicenseResult<LicenseRecord> {
    if let Some(mut record) = find_available(conn)? {
        record.buyer_email = Some(buyer_email.to_string());
        update_record(conn, &record)?;
        debug!(code = %record.license_code, "assigned pre-provisioned license");
        return Ok(record);
    }

    // Pool exhausted: mint on demand.
    let code = LicenseCode::generate();
    let record = insert_record(conn, &code, Some(buyer_email))?;
    info!(code = %record.license_code, "minted new license, stock pool empty");
    Ok(record)
}
