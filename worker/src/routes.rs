use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sender::config::{parse_instant, Config};
use sender::generate::ReadingGenerator;
use sender::send::{ApiClient, SendOutcome};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::dispatch::{self, DispatchSummary};
use crate::metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: ApiClient,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/send-all", post(send_all))
        .route("/send-single", post(send_single))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "EMS worker is running" }))
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}

async fn send_all(State(state): State<AppState>) -> Result<Json<DispatchSummary>, AppError> {
    let summary = dispatch::send_all(
        &state.config,
        &state.client,
        state.batch_size,
        Duration::from_millis(state.batch_pause_ms),
    )
    .await?;

    Ok(Json(summary))
}

#[derive(Debug, Default, Deserialize)]
pub struct SendSingleRequest {
    pub timestamp: Option<String>,
}

async fn send_single(
    State(state): State<AppState>,
    body: Option<Json<SendSingleRequest>>,
) -> Result<Json<SendOutcome>, AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let instant = match &request.timestamp {
        Some(raw) => parse_instant(raw)
            .map_err(|e| AppError::bad_request(format!("Invalid timestamp '{}': {}", raw, e)))?,
        None => state.config.local_now(),
    };

    info!("Sending single envelope for {}", instant);

    let mut generator = ReadingGenerator::from_entropy();
    let envelope = generator.envelope(&state.config, instant);
    let outcome = state.client.send(&envelope).await;

    if outcome.success {
        metrics::ENVELOPES_SENT_TOTAL.inc();
    } else {
        metrics::ENVELOPES_FAILED_TOTAL.inc();
    }

    Ok(Json(outcome))
}

pub struct AppError {
    status: StatusCode,
    inner: anyhow::Error,
}

impl AppError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            inner: anyhow::anyhow!(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("API error: {}", self.inner);
        (self.status, self.inner.to_string()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            inner: err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_single_request_parsing() {
        let request: SendSingleRequest =
            serde_json::from_str(r#"{"timestamp":"2025-10-20T00:00:00"}"#).unwrap();
        assert_eq!(request.timestamp.as_deref(), Some("2025-10-20T00:00:00"));

        let request: SendSingleRequest = serde_json::from_str("{}").unwrap();
        assert!(request.timestamp.is_none());
    }

    #[test]
    fn test_bad_request_status() {
        let err = AppError::bad_request("Invalid timestamp".to_string());
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
