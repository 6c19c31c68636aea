//! Error types for the license lifecycle core.

use keymint_types::LicenseCode;
use thiserror::Error;

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

/// License lifecycle errors.
///
/// The first four are domain rejections and never leave partial writes
/// behind; `Storage` is transient infrastructure and always means the
/// in-flight transaction rolled back; `NotificationFailed` is the one
/// deliberate exception — the license record committed but the buyer was
/// not told about it.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Missing or malformed input; rejected before any store access.
    #[error("invalid request: {0}")]
    Validation(String),

    /// No record carries the presented license code.
    #[error("unknown license code")]
    UnknownCode,

    /// The license is already bound to different hardware.
    #[error("license already in use on another device")]
    DeviceMismatch,

    /// The license's validity window has lapsed (by calendar date).
    #[error("license expired on {0}")]
    Expired(String),

    /// Storage error; the transaction rolled back fully.
    #[error("storage error: {0}")]
    Storage(String),

    /// The license record committed but the notification sink refused
    /// delivery. The code is carried so the operator can re-send.
    #[error("notification delivery refused for license {code}")]
    NotificationFailed {
        /// The committed license code that went unmailed.
        code: LicenseCode,
    },
}

impl From<keymint_store::StoreError> for LicenseError {
    fn from(e: keymint_store::StoreError) -> Self {
        Self::Storage(e.to_string())
    }
}
