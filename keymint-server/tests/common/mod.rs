//! Shared test helpers for the HTTP API tests.

#![allow(dead_code)]

use keymint_license::{LicenseService, LogNotifier, NotificationSink, PurchaseOutcome};
use keymint_server::{build_router, AppState};
use keymint_store::LicenseStore;
use keymint_types::LicenseCode;
use std::sync::{Arc, Mutex};

/// A running test server over an in-memory store.
pub struct TestServer {
    pub base: String,
    pub store: LicenseStore,
}

/// Spins up the HTTP server on an OS-assigned port.
pub async fn spawn_server(
    notifier: Arc<dyn NotificationSink>,
    admin_token: Option<&str>,
) -> TestServer {
    let store = LicenseStore::open_in_memory().unwrap();
    let state = AppState {
        service: LicenseService::new(store.clone(), notifier),
        admin_token: admin_token.map(String::from),
    };
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        store,
    }
}

/// Default server: log-only notifier, no admin token.
pub async fn spawn_default() -> TestServer {
    spawn_server(Arc::new(LogNotifier), None).await
}

/// Notifier that refuses every delivery.
pub struct RefusingNotifier;

impl NotificationSink for RefusingNotifier {
    fn deliver(&self, _: &LicenseCode, _: &str, _: PurchaseOutcome) -> bool {
        false
    }
}

/// Notifier that records recipients and accepts delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    pub recipients: Mutex<Vec<String>>,
}

impl NotificationSink for RecordingNotifier {
    fn deliver(&self, _: &LicenseCode, recipient: &str, _: PurchaseOutcome) -> bool {
        self.recipients.lock().unwrap().push(recipient.to_string());
        true
    }
}
