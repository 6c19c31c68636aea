//! The `LicenseService` facade: one store transaction per operation.

use crate::activation::{activate, ActivationGrant};
use crate::allocator::allocate_for_buyer;
use crate::error::{LicenseError, LicenseResult};
use crate::notify::NotificationSink;
use crate::renewal::{renew_or_allocate, Fulfillment, PurchaseOutcome};
use chrono::Utc;
use keymint_store::{insert_record, LicenseStore};
use keymint_types::{HardwareId, LicenseCode};
use std::sync::Arc;
use tracing::warn;

/// Bounds on one admin provisioning request.
const PROVISION_MIN: u32 = 1;
const PROVISION_MAX: u32 = 100;

/// Stateless entry point for every license operation.
///
/// Handlers share one `LicenseService` (it is cheap to clone); all state
/// lives in the store. Each operation runs as a single exclusive store
/// transaction, so concurrent calls touching the same record serialize
/// and failed calls leave nothing behind.
#[derive(Clone)]
pub struct LicenseService {
    store: LicenseStore,
    notifier: Arc<dyn NotificationSink>,
}

impl LicenseService {
    /// Creates a service over the given store and notification sink.
    pub fn new(store: LicenseStore, notifier: Arc<dyn NotificationSink>) -> Self {
        Self { store, notifier }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &LicenseStore {
        &self.store
    }

    /// Fulfills one shop-order purchase event for `buyer_email`.
    ///
    /// Repeat buyers renew their latest record (stack or reset); new
    /// buyers get an assigned or minted code. The record commits first;
    /// only then is the notification sink invoked. A refused delivery
    /// surfaces as [`LicenseError::NotificationFailed`] carrying the
    /// already-committed code.
    pub fn fulfill_purchase(&self, buyer_email: &str) -> LicenseResult<Fulfillment> {
        let buyer_email = buyer_email.trim();
        if buyer_email.is_empty() {
            return Err(LicenseError::Validation("buyer email is empty".to_string()));
        }

        let fulfillment = self
            .store
            .with_txn(|conn| renew_or_allocate(conn, buyer_email, Utc::now()))?;

        if !self
            .notifier
            .deliver(&fulfillment.license_code, buyer_email, fulfillment.outcome)
        {
            warn!(
                code = %fulfillment.license_code,
                recipient = buyer_email,
                "license committed but notification was refused"
            );
            return Err(LicenseError::NotificationFailed {
                code: fulfillment.license_code,
            });
        }
        Ok(fulfillment)
    }

    /// Allocates a code for a buyer without renewal semantics.
    ///
    /// Admin-facing variant of fulfillment: assigns or mints regardless of
    /// the buyer's purchase history, and sends no notification.
    pub fn allocate(&self, buyer_email: &str) -> LicenseResult<Fulfillment> {
        let buyer_email = buyer_email.trim();
        if buyer_email.is_empty() {
            return Err(LicenseError::Validation("buyer email is empty".to_string()));
        }
        let record = self
            .store
            .with_txn(|conn| allocate_for_buyer(conn, buyer_email))?;
        Ok(Fulfillment {
            license_code: record.license_code,
            outcome: PurchaseOutcome::FirstTime,
        })
    }

    /// Drives one activation request through the state machine.
    pub fn activate(&self, code: &LicenseCode, hwid: &HardwareId) -> LicenseResult<ActivationGrant> {
        self.store
            .with_txn(|conn| activate(conn, code, hwid, Utc::now()))
    }

    /// Pre-creates `count` virgin, unowned records in one transaction.
    ///
    /// `count` outside 1..=100 is rejected before any store access.
    pub fn provision(&self, count: u32) -> LicenseResult<Vec<LicenseCode>> {
        if !(PROVISION_MIN..=PROVISION_MAX).contains(&count) {
            return Err(LicenseError::Validation(format!(
                "provision count must be between {PROVISION_MIN} and {PROVISION_MAX}, got {count}"
            )));
        }
        self.store.with_txn(|conn| {
            (0..count)
                .map(|_| {
                    let record = insert_record(conn, &LicenseCode::generate(), None)?;
                    Ok(record.license_code)
                })
                .collect()
        })
    }
}
