//! The activation state machine: binding a license code to hardware.

use crate::error::{LicenseError, LicenseResult};
use crate::state::{LicenseState, LICENSE_TERM_DAYS};
use chrono::{DateTime, Duration, Utc};
use keymint_store::{find_by_code, update_record};
use keymint_types::{HardwareId, LicenseCode, SessionToken};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Which successful transition ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    /// First binding of a virgin record (201-equivalent).
    Activated,
    /// Repeat call from the already-bound device (200-equivalent).
    Revalidated,
}

/// What a successful activation hands back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationGrant {
    /// Which transition ran.
    pub kind: ActivationKind,
    /// Freshly rotated liveness token.
    pub session_token: SessionToken,
    /// End of the validity window.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Drives one activation request through the state machine.
///
/// Must run inside a `LicenseStore::with_txn` scope; concurrent requests
/// for the same record serialize on the exclusive transaction. Rejections
/// (`UnknownCode`, `DeviceMismatch`, `Expired`) never mutate the record.
///
/// A virgin record gets `expires_at = now + 365d` — unless a renewal
/// already stacked a future expiry onto it, which first binding preserves.
pub fn activate(
    conn: &Connection,
    code: &LicenseCode,
    hwid: &HardwareId,
    now: DateTime<Utc>,
) -> LicenseResult<ActivationGrant> {
    let mut record = find_by_code(conn, code)?.ok_or(LicenseError::UnknownCode)?;

    match LicenseState::of(&record, now) {
        LicenseState::Virgin => {
            let token = SessionToken::generate();
            let expires = match record.expires_at {
                Some(existing) if existing > now => existing,
                _ => now + Duration::days(LICENSE_TERM_DAYS),
            };
            record.bound_hwid = Some(hwid.clone());
            record.activated_at = Some(now);
            record.session_token = Some(token.clone());
            record.expires_at = Some(expires);
            update_record(conn, &record)?;
            info!(code = %code, "license activated and bound");
            Ok(ActivationGrant {
                kind: ActivationKind::Activated,
                session_token: token,
                expires_at: Some(expires),
            })
        }
        bound_state => {
            if record.bound_hwid.as_ref() != Some(hwid) {
                warn!(code = %code, "activation attempt from foreign device");
                return Err(LicenseError::DeviceMismatch);
            }
            if bound_state == LicenseState::BoundExpired {
                let expired_on = record
                    .expires_at
                    .map(|e| e.date_naive().to_string())
                    .unwrap_or_default();
                return Err(LicenseError::Expired(expired_on));
            }
            let token = SessionToken::generate();
            record.session_token = Some(token.clone());
            update_record(conn, &record)?;
            Ok(ActivationGrant {
                kind: ActivationKind::Revalidated,
                session_token: token,
                expires_at: record.expires_at,
            })
        }
    }
}
