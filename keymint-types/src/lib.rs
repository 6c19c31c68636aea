//! Identifier types used throughout the keymint license server.
//!
//! Every value that crosses the wire or lands in the store gets a newtype
//! here, so the domain crates never pass bare strings around.

mod ids;

pub use ids::{HardwareId, IdError, LicenseCode, SessionToken};
