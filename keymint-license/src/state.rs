//! License state classification.
//!
//! A record is `Virgin` until its first activation binds a hardware ID.
//! Once bound it is `BoundValid` or `BoundExpired` depending on the UTC
//! calendar date — not the instant — so a license keeps working through
//! the entirety of its expiration day. `BoundExpired` never transitions
//! back on its own; only the renewal engine's explicit reset returns a
//! record to `Virgin`.

use chrono::{DateTime, Utc};
use keymint_store::LicenseRecord;
use serde::{Deserialize, Serialize};

/// Length of the validity window granted per purchase, in days.
pub const LICENSE_TERM_DAYS: i64 = 365;

/// The lifecycle state of a license record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseState {
    /// Never bound to any hardware.
    Virgin,
    /// Bound, and today is on or before the expiration date.
    BoundValid,
    /// Bound, and today is past the expiration date.
    BoundExpired,
}

impl LicenseState {
    /// Classifies a record at `now`.
    ///
    /// Expiry uses date-truncated comparison: the record is expired only
    /// when `now`'s UTC date is strictly after the expiration date. A
    /// bound record with no expiration set counts as valid.
    #[must_use]
    pub fn of(record: &LicenseRecord, now: DateTime<Utc>) -> Self {
        if record.bound_hwid.is_none() {
            return Self::Virgin;
        }
        match record.expires_at {
            Some(expires) if now.date_naive() > expires.date_naive() => Self::BoundExpired,
            _ => Self::BoundValid,
        }
    }
}
