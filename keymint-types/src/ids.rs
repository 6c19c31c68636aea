//! Identifier newtypes for license codes, session tokens, and hardware IDs.
//!
//! License codes are 128-bit random values rendered as 32 uppercase hex
//! characters — the format printed on the buyer's receipt. Session tokens
//! are 256-bit random values rendered as base64url; they are rotated on
//! every successful activation and carried by the client as a liveness
//! credential only (never validated as authentication).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Errors produced when parsing identifier strings from external input.
#[derive(Debug, Error)]
pub enum IdError {
    /// License code is not 32 hex characters.
    #[error("invalid license code format")]
    InvalidLicenseCode,

    /// Hardware ID is empty or exceeds the length cap.
    #[error("invalid hardware id: {0}")]
    InvalidHardwareId(String),
}

/// A sellable license code: 128 bits of randomness, 32 uppercase hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseCode(String);

impl LicenseCode {
    /// Generates a fresh random license code.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string().to_uppercase())
    }

    /// Parses a license code from client input.
    ///
    /// Accepts lowercase input and normalizes to uppercase, since buyers
    /// retype these by hand.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let s = s.trim();
        if s.len() != 32 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidLicenseCode);
        }
        Ok(Self(s.to_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicenseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LicenseCode {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A short-lived opaque token handed to the client on each successful
/// activation or revalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generates a fresh 256-bit random token.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wraps a token string loaded from the store.
    #[must_use]
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A client-supplied hardware fingerprint, pinned to a license on first
/// activation. Opaque to the server; only compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareId(String);

/// Upper bound on HWID length; anything larger is a malformed client.
const MAX_HWID_LEN: usize = 128;

impl HardwareId {
    /// Validates and wraps a client-supplied hardware fingerprint.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::InvalidHardwareId("empty".to_string()));
        }
        if s.len() > MAX_HWID_LEN {
            return Err(IdError::InvalidHardwareId(format!(
                "longer than {MAX_HWID_LEN} bytes"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the fingerprint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HardwareId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
