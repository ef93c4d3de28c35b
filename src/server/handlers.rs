//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use subtle::ConstantTimeEq;

use super::signature::verify_signature;
use super::types::*;
use crate::bot::Dispatcher;
use crate::messenger::webhook::WebhookPayload;
use crate::store::flock_counts;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>, code: &str) -> ApiError {
    (status, Json(ErrorResponse::with_code(message, code)))
}

/// Application state shared across all handlers
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Key of the delivery signature HMAC
    pub app_secret: String,
    /// Token expected in the subscription handshake
    pub validation_token: String,
}

impl AppState {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        app_secret: impl Into<String>,
        validation_token: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            dispatcher,
            app_secret: app_secret.into(),
            validation_token: validation_token.into(),
        })
    }
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// `GET /webhook`: subscription handshake.
///
/// Echoes `hub.challenge` when `hub.mode` is `subscribe` and the token
/// matches the configured validation token.
pub async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Result<String, ApiError> {
    let token_matches = query.verify_token.as_deref().is_some_and(|token| {
        bool::from(token.as_bytes().ct_eq(state.validation_token.as_bytes()))
    });

    match (query.mode.as_deref(), query.challenge) {
        (Some("subscribe"), Some(challenge)) if token_matches => {
            tracing::info!("Webhook subscription validated");
            Ok(challenge)
        }
        _ => {
            tracing::warn!("Failed webhook validation, mode {:?}", query.mode);
            Err(api_error(
                StatusCode::FORBIDDEN,
                "Validation failed",
                "VALIDATION_FAILED",
            ))
        }
    }
}

/// `POST /webhook`: event delivery.
///
/// # Response
///
/// - `200 OK`: every event was dispatched
/// - `400 Bad Request`: body is not a webhook payload
/// - `403 Forbidden`: signature missing or wrong
/// - `404 Not Found`: subscription object is not `page`
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = verify_signature(&state.app_secret, &headers, &body) {
        tracing::warn!("Rejected webhook delivery: {}", e);
        return Err(api_error(
            StatusCode::FORBIDDEN,
            e.to_string(),
            "INVALID_SIGNATURE",
        ));
    }

    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Unparseable webhook body: {}", e);
        api_error(StatusCode::BAD_REQUEST, e.to_string(), "INVALID_BODY")
    })?;

    if payload.object != "page" {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Unsupported object `{}`", payload.object),
            "UNSUPPORTED_OBJECT",
        ));
    }

    let events = payload.entry.iter().flat_map(|entry| entry.messaging.iter());
    let handled = state.dispatcher.handle_all(events);
    tracing::debug!("Dispatched {} events", handled.len());

    Ok(StatusCode::OK)
}

/// `GET /reports`: stored reports with per-flock counts.
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListReportsResponse>, ApiError> {
    let reports = state.dispatcher.store().list().await.map_err(|e| {
        tracing::error!("Failed to list reports: {}", e);
        api_error(StatusCode::BAD_GATEWAY, e.to_string(), "STORE_UNAVAILABLE")
    })?;

    Ok(Json(ListReportsResponse {
        flocks: flock_counts(&reports),
        count: reports.len(),
        reports,
    }))
}

/// `GET /sessions`: conversations in progress.
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<ListSessionsResponse> {
    let sessions = state.dispatcher.sessions().list();
    Json(ListSessionsResponse {
        count: sessions.len(),
        sessions,
    })
}
