//! HTTP API for the keymint license server.
//!
//! Three endpoints, all JSON:
//! - `POST /api/v1/activate` — the desktop client's activation call
//! - `POST /api/v1/webhooks/purchase` — the shop's purchase event webhook
//! - `POST /admin/v1/provision` — operator bulk pre-creation of stock
//!
//! Every response carries `success` and a human-readable `message`.
//! Storage failures map to a generic category; internal error text never
//! reaches a client.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use keymint_license::{ActivationKind, LicenseError, LicenseService, PurchaseOutcome};
use keymint_types::{HardwareId, LicenseCode, SessionToken};
use serde::{Deserialize, Serialize};
use tracing::error;

/// The purchase event type that triggers fulfillment; everything else is
/// acknowledged and ignored.
pub const SHOP_ORDER_EVENT: &str = "shop_order";

/// Header carrying the shared admin secret.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    /// The license lifecycle core.
    pub service: LicenseService,
    /// Shared secret for the admin endpoint; `None` disables it entirely.
    pub admin_token: Option<String>,
}

// ── Wire types ───────────────────────────────────────────────

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ActivateRequest {
    pub license_code: String,
    pub hwid: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ActivateResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<SessionToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PurchaseEvent {
    pub event_type: String,
    #[serde(default)]
    pub buyer_email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PurchaseResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_code: Option<LicenseCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PurchaseOutcome>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProvisionRequest {
    pub count: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProvisionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub codes: Vec<LicenseCode>,
}

// ── Handlers ─────────────────────────────────────────────────

async fn activate_handler(
    State(state): State<AppState>,
    Json(req): Json<ActivateRequest>,
) -> (StatusCode, Json<ActivateResponse>) {
    let parsed = LicenseCode::parse(&req.license_code)
        .map_err(|e| LicenseError::Validation(e.to_string()))
        .and_then(|code| {
            let hwid = HardwareId::parse(&req.hwid)
                .map_err(|e| LicenseError::Validation(e.to_string()))?;
            Ok((code, hwid))
        });

    let result = parsed.and_then(|(code, hwid)| state.service.activate(&code, &hwid));
    match result {
        Ok(grant) => {
            let (status, message) = match grant.kind {
                ActivationKind::Activated => (StatusCode::CREATED, "License activated."),
                ActivationKind::Revalidated => (StatusCode::OK, "License revalidated."),
            };
            (
                status,
                Json(ActivateResponse {
                    success: true,
                    message: message.to_string(),
                    session_token: Some(grant.session_token),
                    expires_at: grant.expires_at,
                }),
            )
        }
        Err(err) => {
            let (status, message) = reject(&err);
            (
                status,
                Json(ActivateResponse {
                    success: false,
                    message,
                    session_token: None,
                    expires_at: None,
                }),
            )
        }
    }
}

async fn purchase_handler(
    State(state): State<AppState>,
    Json(event): Json<PurchaseEvent>,
) -> (StatusCode, Json<PurchaseResponse>) {
    if event.event_type != SHOP_ORDER_EVENT {
        return (
            StatusCode::OK,
            Json(PurchaseResponse {
                success: true,
                message: format!("event '{}' acknowledged and ignored", event.event_type),
                license_code: None,
                outcome: None,
            }),
        );
    }

    let Some(buyer_email) = event.buyer_email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(PurchaseResponse {
                success: false,
                message: "shop_order event is missing buyer_email".to_string(),
                license_code: None,
                outcome: None,
            }),
        );
    };

    match state.service.fulfill_purchase(buyer_email) {
        Ok(fulfillment) => (
            StatusCode::OK,
            Json(PurchaseResponse {
                success: true,
                message: "purchase fulfilled".to_string(),
                license_code: Some(fulfillment.license_code),
                outcome: Some(fulfillment.outcome),
            }),
        ),
        Err(err) => {
            let (status, message) = reject(&err);
            (
                status,
                Json(PurchaseResponse {
                    success: false,
                    message,
                    license_code: None,
                    outcome: None,
                }),
            )
        }
    }
}

async fn provision_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ProvisionRequest>,
) -> (StatusCode, Json<ProvisionResponse>) {
    // Deny-by-default: no configured token means no admin interface.
    let authorized = match &state.admin_token {
        Some(expected) => headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|got| got == expected),
        None => false,
    };
    if !authorized {
        return (
            StatusCode::FORBIDDEN,
            Json(ProvisionResponse {
                success: false,
                message: "admin access denied".to_string(),
                codes: Vec::new(),
            }),
        );
    }

    match state.service.provision(req.count) {
        Ok(codes) => (
            StatusCode::OK,
            Json(ProvisionResponse {
                success: true,
                message: format!("provisioned {} licenses", codes.len()),
                codes,
            }),
        ),
        Err(err) => {
            let (status, message) = reject(&err);
            (
                status,
                Json(ProvisionResponse {
                    success: false,
                    message,
                    codes: Vec::new(),
                }),
            )
        }
    }
}

/// Maps a domain error to its HTTP status and client-safe message.
fn reject(err: &LicenseError) -> (StatusCode, String) {
    match err {
        LicenseError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        LicenseError::UnknownCode => (StatusCode::NOT_FOUND, err.to_string()),
        LicenseError::DeviceMismatch | LicenseError::Expired(_) => {
            (StatusCode::FORBIDDEN, err.to_string())
        }
        LicenseError::NotificationFailed { .. } => {
            error!("purchase committed but notification delivery failed");
            (
                StatusCode::BAD_GATEWAY,
                "license recorded but notification delivery failed".to_string(),
            )
        }
        LicenseError::Storage(detail) => {
            // Log the detail, return only the category.
            error!(%detail, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal storage error".to_string(),
            )
        }
    }
}

/// Build the HTTP API router with the given application state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/activate", post(activate_handler))
        .route("/api/v1/webhooks/purchase", post(purchase_handler))
        .route("/admin/v1/provision", post(provision_handler))
        .with_state(state)
}
