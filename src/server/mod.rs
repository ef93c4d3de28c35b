//! HTTP server: Messenger webhook plus operator endpoints.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | /health | Health check |
//! | GET | /webhook | Subscription handshake |
//! | POST | /webhook | Event delivery (signed) |
//! | GET | /reports | Stored reports and flock counts |
//! | GET | /sessions | Conversations in progress |

mod handlers;
pub mod signature;
pub mod types;

pub use handlers::AppState;
pub use signature::{verify_signature, SignatureError};
pub use types::{ErrorResponse, HealthResponse, ListReportsResponse, ListSessionsResponse, SessionInfo};

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Bind and serve until `shutdown` is cancelled.
///
/// Returns the bound address (useful with port 0) and the server task.
pub async fn start_server(
    host: &str,
    port: u16,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = create_router(state);

    let listener = TcpListener::bind((host, port)).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!("HTTP server listening on {}", actual_addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, handle))
}

/// Create the router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/webhook",
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        .route("/reports", get(handlers::list_reports))
        .route("/sessions", get(handlers::list_sessions))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Dispatcher;
    use crate::dialogue::controller::{DialogueController, Keywords};
    use crate::dialogue::finalizer::ReportFinalizer;
    use crate::dialogue::prompts::{PromptRenderer, Reply};
    use crate::messenger::client::Messenger;
    use crate::store::{MemoryReportStore, ReportStore};
    use crate::testing::{FailingStore, RecordingMessenger};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const SECRET: &str = "app-secret";
    const TOKEN: &str = "verify-me";

    fn state_with(messenger: Arc<dyn Messenger>, store: Arc<dyn ReportStore>) -> Arc<AppState> {
        let dispatcher = Dispatcher::new(
            DialogueController::new(
                Keywords::default(),
                PromptRenderer::new("https://birds.example.com", "דווח", "בטל"),
            ),
            ReportFinalizer::new("בוט ציפורים", "2357", "https://birds.example.com"),
            messenger,
            store,
        );
        AppState::new(Arc::new(dispatcher), SECRET, TOKEN)
    }

    fn state() -> Arc<AppState> {
        state_with(
            Arc::new(RecordingMessenger::new()),
            Arc::new(MemoryReportStore::new()),
        )
    }

    async fn get_uri(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn delivery(body: &str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(signature::SIGNATURE_256_HEADER, signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn signed(body: &str) -> Request<Body> {
        delivery(body, Some(signature::sign_sha256(SECRET, body.as_bytes())))
    }

    fn text_delivery(sender: &str, text: &str) -> String {
        serde_json::json!({
            "object": "page",
            "entry": [{
                "id": "page-1",
                "time": 1,
                "messaging": [{
                    "sender": {"id": sender},
                    "recipient": {"id": "page-1"},
                    "timestamp": 1,
                    "message": {"mid": "m1", "text": text}
                }]
            }]
        })
        .to_string()
    }

    mod verification_tests {
        use super::*;

        #[tokio::test]
        async fn echoes_challenge_for_valid_token() {
            let response = get_uri(
                create_router(state()),
                "/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=4242",
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(&bytes[..], b"4242");
        }

        #[tokio::test]
        async fn wrong_token_is_forbidden() {
            let response = get_uri(
                create_router(state()),
                "/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=4242",
            )
            .await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }

        #[tokio::test]
        async fn wrong_mode_is_forbidden() {
            let response = get_uri(
                create_router(state()),
                "/webhook?hub.mode=unsubscribe&hub.verify_token=verify-me&hub.challenge=1",
            )
            .await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }
    }

    mod delivery_tests {
        use super::*;

        #[tokio::test]
        async fn signed_delivery_is_dispatched() {
            let messenger = Arc::new(RecordingMessenger::new());
            let state = state_with(messenger.clone(), Arc::new(MemoryReportStore::new()));
            let app = create_router(state.clone());

            let response = app.oneshot(signed(&text_delivery("u1", "דווח"))).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            state.dispatcher.drain().await;
            assert!(state.dispatcher.sessions().contains("u1"));
            assert!(matches!(
                messenger.sent_to("u1").last(),
                Some(Reply::LocationRequest { .. })
            ));
        }

        #[tokio::test]
        async fn unsigned_delivery_is_forbidden() {
            let state = state();
            let response = create_router(state.clone())
                .oneshot(delivery(&text_delivery("u1", "דווח"), None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert_eq!(body_json(response).await["code"], "INVALID_SIGNATURE");
            assert!(!state.dispatcher.sessions().contains("u1"));
        }

        #[tokio::test]
        async fn bad_signature_is_forbidden_before_parsing() {
            let response = create_router(state())
                .oneshot(delivery("not json", Some("sha256=00ff".to_string())))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }

        #[tokio::test]
        async fn malformed_json_is_bad_request() {
            let response = create_router(state())
                .oneshot(signed("{not json"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        #[tokio::test]
        async fn non_page_object_is_not_found() {
            let response = create_router(state())
                .oneshot(signed(r#"{"object":"instagram","entry":[]}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    mod operator_tests {
        use super::*;

        #[tokio::test]
        async fn health_endpoint_works() {
            let response = get_uri(create_router(state()), "/health").await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await["status"], "ok");
        }

        #[tokio::test]
        async fn sessions_lists_active_conversations() {
            let state = state();
            create_router(state.clone())
                .oneshot(signed(&text_delivery("u1", "report")))
                .await
                .unwrap();

            let json = body_json(get_uri(create_router(state.clone()), "/sessions").await).await;
            assert_eq!(json["count"], 1);
            assert_eq!(json["sessions"][0]["user_id"], "u1");
            assert_eq!(json["sessions"][0]["state"], "awaiting_location");
            state.dispatcher.drain().await;
        }

        #[tokio::test]
        async fn reports_include_flock_counts() {
            let store = Arc::new(MemoryReportStore::new());
            let state = state_with(Arc::new(RecordingMessenger::new()), store.clone());
            let report = ReportFinalizer::new("בוט ציפורים", "2357", "https://birds.example.com")
                .finalize(
                    crate::dialogue::draft::CompletedDraft {
                        reporter_id: "u1".to_string(),
                        latitude: 1.0,
                        longitude: 2.0,
                        bird_type: crate::dialogue::draft::BirdType::Unknown,
                        amount: crate::dialogue::draft::Amount::Exact(10),
                        height: crate::dialogue::draft::Height::Exact(20),
                    },
                    chrono::Utc::now(),
                );
            store.submit(&report).await.unwrap();

            let response = get_uri(create_router(state), "/reports").await;
            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            assert_eq!(json["count"], 1);
            assert_eq!(json["flocks"][0]["flock_id"], "2357");
            assert_eq!(json["flocks"][0]["count"], 1);
        }

        #[tokio::test]
        async fn store_failure_is_bad_gateway() {
            let state = state_with(
                Arc::new(RecordingMessenger::new()),
                Arc::new(FailingStore::default()),
            );
            let response = get_uri(create_router(state), "/reports").await;
            assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
            assert_eq!(body_json(response).await["code"], "STORE_UNAVAILABLE");
        }
    }

    mod server_tests {
        use super::*;

        #[tokio::test]
        async fn start_server_binds_and_shuts_down() {
            let shutdown = CancellationToken::new();
            let (addr, handle) = start_server("127.0.0.1", 0, state(), shutdown.clone())
                .await
                .expect("Server should start");
            assert!(addr.port() > 0);

            shutdown.cancel();
            handle.await.expect("server task should finish");
        }
    }
}
