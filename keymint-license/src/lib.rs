//! License lifecycle core for keymint.
//!
//! This crate owns the three pieces with real invariants:
//! - **Key allocation**: exactly one license code per purchase, with no
//!   double-assignment of pre-provisioned stock under concurrent buyers
//! - **Activation**: the virgin → bound → expired state machine that pins
//!   a license to one hardware fingerprint
//! - **Renewal**: additive stacking of unexpired time on repeat purchase,
//!   or reset-to-virgin when the old license already lapsed
//!
//! # Design Principles
//!
//! - **One transaction per operation**: every mutating operation runs in a
//!   single exclusive store transaction; a failure rolls back everything
//! - **Binding is immutable**: a bound hardware ID changes only through
//!   the explicit reset-for-renewal path, never through activation
//! - **Grace through end of day**: expiry is judged on the UTC calendar
//!   date, so a license works for the whole of its expiration day

mod activation;
mod allocator;
mod error;
mod notify;
mod renewal;
mod service;
mod state;

pub use activation::{activate, ActivationGrant, ActivationKind};
pub use allocator::allocate_for_buyer;
pub use error::{LicenseError, LicenseResult};
pub use notify::{LogNotifier, NotificationSink};
pub use renewal::{renew_or_allocate, Fulfillment, PurchaseOutcome};
pub use service::LicenseService;
pub use state::{LicenseState, LICENSE_TERM_DAYS};
