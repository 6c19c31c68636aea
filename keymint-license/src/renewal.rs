//! Renewal and stacking: what a repeat purchase does to an existing record.

use crate::allocator::allocate_for_buyer;
use crate::error::LicenseResult;
use crate::state::LICENSE_TERM_DAYS;
use chrono::{DateTime, Duration, Utc};
use keymint_store::{latest_for_buyer, update_record};
use keymint_types::LicenseCode;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::info;

/// What a purchase event did, selecting downstream notification content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOutcome {
    /// New buyer; a record was assigned or minted.
    FirstTime,
    /// Existing unexpired record; 365 days stacked onto its expiry.
    ExtendedWhileActive,
    /// Existing expired (or never-activated) record; reset to virgin so
    /// the next activation re-grants a fresh window.
    ResetForReactivation,
}

/// The result of fulfilling one purchase event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    /// The code to deliver to the buyer.
    pub license_code: LicenseCode,
    /// Which fulfillment path ran.
    pub outcome: PurchaseOutcome,
}

/// Decides between extending, resetting, or allocating for a purchase.
///
/// Must run inside a `LicenseStore::with_txn` scope so that renewal and
/// allocation for one purchase event form a single atomic unit — no
/// interleaving can double-assign or double-extend for the same event.
///
/// The buyer's record with the latest expiry (ties broken toward the
/// highest id) is the renewal target:
/// - still active at the instant `now` → stack [`LICENSE_TERM_DAYS`] onto
///   the *current* expiry, preserving unused remaining time, and clear the
///   session token;
/// - expired or never activated → clear binding, activation time, token,
///   and expiry entirely, returning the record to virgin state.
pub fn renew_or_allocate(
    conn: &Connection,
    buyer_email: &str,
    now: DateTime<Utc>,
) -> LicenseResult<Fulfillment> {
    let Some(mut record) = latest_for_buyer(conn, buyer_email)? else {
        let record = allocate_for_buyer(conn, buyer_email)?;
        return Ok(Fulfillment {
            license_code: record.license_code,
            outcome: PurchaseOutcome::FirstTime,
        });
    };

    match record.expires_at {
        // Instant comparison here, not calendar-date: stacking applies to
        // any window that has not fully elapsed yet.
        Some(expires) if now < expires => {
            let extended = expires + Duration::days(LICENSE_TERM_DAYS);
            record.expires_at = Some(extended);
            record.session_token = None;
            update_record(conn, &record)?;
            info!(
                code = %record.license_code,
                expires_at = %extended,
                "stacked renewal onto active license"
            );
            Ok(Fulfillment {
                license_code: record.license_code,
                outcome: PurchaseOutcome::ExtendedWhileActive,
            })
        }
        _ => {
            record.bound_hwid = None;
            record.activated_at = None;
            record.session_token = None;
            record.expires_at = None;
            update_record(conn, &record)?;
            info!(code = %record.license_code, "reset lapsed license for reactivation");
            Ok(Fulfillment {
                license_code: record.license_code,
                outcome: PurchaseOutcome::ResetForReactivation,
            })
        }
    }
}
