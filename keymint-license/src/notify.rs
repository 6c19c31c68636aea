//! Notification sink: telling the buyer their license code.
//!
//! Outbound email is an external collaborator; the core only depends on a
//! boolean delivery-accepted contract. A refused delivery after the record
//! committed is a documented, deliberate inconsistency: the license exists
//! unmailed, and the purchase operation reports failure so the upstream
//! webhook sender retries the whole event.

use crate::renewal::PurchaseOutcome;
use keymint_types::LicenseCode;
use tracing::info;

/// Accepts fulfillment notices for delivery to the buyer.
pub trait NotificationSink: Send + Sync {
    /// Hands `(code, recipient, outcome)` to the delivery channel.
    /// Returns true when the channel accepted the notice.
    fn deliver(&self, code: &LicenseCode, recipient: &str, outcome: PurchaseOutcome) -> bool;
}

/// Sink that records the notice in the server log and accepts it.
///
/// Stands in wherever no mail transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn deliver(&self, code: &LicenseCode, recipient: &str, outcome: PurchaseOutcome) -> bool {
        info!(code = %code, recipient, ?outcome, "license notice logged for delivery");
        true
    }
}
