//! The license record entity: one row of the `licenses` table.

use chrono::{DateTime, Utc};
use keymint_types::{HardwareId, LicenseCode, SessionToken};
use serde::{Deserialize, Serialize};

/// A single license record — the unit of sale.
///
/// A record with `buyer_email` unset is "available": pre-provisioned stock
/// eligible for allocation to the next purchase. Once `bound_hwid` is set
/// it never changes except through the explicit reset-for-renewal path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Surrogate row id, assigned by the store, immutable.
    pub id: i64,
    /// Globally unique sellable code, assigned at creation, immutable.
    pub license_code: LicenseCode,
    /// Hardware fingerprint pinned at first activation.
    pub bound_hwid: Option<HardwareId>,
    /// When the record was first bound to hardware.
    pub activated_at: Option<DateTime<Utc>>,
    /// Liveness token rotated on every successful activation/revalidation.
    pub session_token: Option<SessionToken>,
    /// End of the validity window; unset until first binding.
    pub expires_at: Option<DateTime<Utc>>,
    /// Purchaser identity; unset means the record is available stock.
    pub buyer_email: Option<String>,
}

impl LicenseRecord {
    /// Returns true if no buyer owns this record yet.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.buyer_email.is_none()
    }

    /// Returns true if the record has never been bound to hardware.
    #[must_use]
    pub fn is_virgin(&self) -> bool {
        self.bound_hwid.is_none()
    }
}
