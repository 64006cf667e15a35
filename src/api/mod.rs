//! HTTP API for the UI collaborator
//!
//! Exposes tracker state and operations: health/readiness, the current
//! snapshot, create, retry, close-modal and reset.

use crate::config::ApiConfig;
use crate::error::{TrackerResult, TransactionError};
use crate::store::TransactionStore;
use crate::tracker::{TrackerSnapshot, TransactionTracker};
use crate::transaction::{NewTransaction, Transaction, TransactionId};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<TransactionTracker>,
    pub store: Arc<dyn TransactionStore>,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/status", get(get_status))
        .route("/transactions", post(create_transaction))
        .route("/transactions/:id/retry", post(retry_transaction))
        .route("/modal/close", post(close_modal))
        .route("/reset", post(reset))
        // The UI collaborator is a browser app on another origin.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP API server
pub async fn run_server(config: ApiConfig, state: AppState) -> TrackerResult<()> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint - basic liveness
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check - verify the store is reachable
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = state.store.ping().await;

    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadinessResponse {
            ready: store_ok,
            store: store_ok,
        }),
    )
}

/// Current tracker snapshot
async fn get_status(State(state): State<AppState>) -> Json<TrackerSnapshot> {
    Json(state.tracker.snapshot().await)
}

/// Create a transaction and begin tracking it
async fn create_transaction(
    State(state): State<AppState>,
    Json(new): Json<NewTransaction>,
) -> impl IntoResponse {
    match state.tracker.create_transaction(&new).await {
        Some(transaction) => (StatusCode::CREATED, Json(CreateResponse::Ok(transaction))),
        None => {
            let error = state.tracker.snapshot().await.error;
            (StatusCode::BAD_GATEWAY, Json(CreateResponse::Err { error }))
        }
    }
}

/// Retry a transaction and begin tracking the store's answer
async fn retry_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = TransactionId::from(id.as_str());
    match state.tracker.retry_transaction(&id).await {
        Some(transaction) => (StatusCode::OK, Json(CreateResponse::Ok(transaction))),
        None => {
            let error = state.tracker.snapshot().await.error;
            (StatusCode::BAD_GATEWAY, Json(CreateResponse::Err { error }))
        }
    }
}

/// Close the modal surface without stopping tracking
async fn close_modal(State(state): State<AppState>) -> StatusCode {
    state.tracker.close_modal().await;
    StatusCode::NO_CONTENT
}

/// Clear tracker state and cancel polling
async fn reset(State(state): State<AppState>) -> StatusCode {
    state.tracker.reset().await;
    StatusCode::NO_CONTENT
}

// Response types

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    store: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
enum CreateResponse {
    Ok(Transaction),
    Err { error: Option<TransactionError> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockTransactionStore;
    use crate::tracker::TrackerCallbacks;
    use crate::transaction::TransactionStatus;

    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(mock: MockTransactionStore) -> (Router, Arc<TransactionTracker>) {
        let store: Arc<dyn TransactionStore> = Arc::new(mock);
        let tracker = Arc::new(TransactionTracker::new(
            store.clone(),
            TrackerCallbacks::default(),
            Duration::from_secs(3),
        ));
        let router = router(AppState {
            tracker: tracker.clone(),
            store,
        });
        (router, tracker)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (app, _) = app(MockTransactionStore::new());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn ready_reflects_store_reachability() {
        let mut mock = MockTransactionStore::new();
        mock.expect_ping().returning(|| false);
        let (app, _) = app(mock);

        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["ready"], false);
    }

    #[tokio::test]
    async fn status_returns_snapshot() {
        let mut mock = MockTransactionStore::new();
        mock.expect_status()
            .returning(|_| Ok(Transaction::new(1, TransactionStatus::Pending)));
        let (app, tracker) = app(mock);

        tracker
            .track_transaction(Transaction::new(1, TransactionStatus::Pending))
            .await;

        let response = app
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "pending");
        assert_eq!(json["modal_open"], true);
        assert_eq!(json["transaction"]["id"], 1);

        tracker.reset().await;
    }

    #[tokio::test]
    async fn create_failure_maps_to_bad_gateway() {
        let mut mock = MockTransactionStore::new();
        mock.expect_create().returning(|_| {
            Err(crate::error::TrackerError::Store {
                status: 500,
                body: "down".to_string(),
            })
        });
        let (app, _) = app(mock);

        let payload = serde_json::json!({
            "source_chain": "ethereum",
            "destination_chain": "arbitrum",
            "amount": "100",
            "wallet_address": "0xabc"
        });
        let response = app
            .oneshot(
                Request::post("/transactions")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["type"], "network_error");
    }

    #[tokio::test]
    async fn close_modal_and_reset_return_no_content() {
        let (app, _) = app(MockTransactionStore::new());

        let response = app
            .clone()
            .oneshot(Request::post("/modal/close").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(Request::post("/reset").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
