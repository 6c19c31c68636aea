//! Shared test helpers for license lifecycle tests.

#![allow(dead_code)]

use keymint_license::{LicenseService, LogNotifier, NotificationSink, PurchaseOutcome};
use keymint_store::LicenseStore;
use keymint_types::LicenseCode;
use std::sync::{Arc, Mutex};

/// Opens a fresh in-memory store.
pub fn mem_store() -> LicenseStore {
    LicenseStore::open_in_memory().unwrap()
}

/// A service over an in-memory store with a log-only notifier.
pub fn service() -> LicenseService {
    LicenseService::new(mem_store(), Arc::new(LogNotifier))
}

/// Notifier that records every notice and accepts delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<(LicenseCode, String, PurchaseOutcome)>>,
}

impl NotificationSink for RecordingNotifier {
    fn deliver(&self, code: &LicenseCode, recipient: &str, outcome: PurchaseOutcome) -> bool {
        self.notices
            .lock()
            .unwrap()
            .push((code.clone(), recipient.to_string(), outcome));
        true
    }
}

/// Notifier that refuses every delivery.
pub struct RefusingNotifier;

impl NotificationSink for RefusingNotifier {
    fn deliver(&self, _: &LicenseCode, _: &str, _: PurchaseOutcome) -> bool {
        false
    }
}
