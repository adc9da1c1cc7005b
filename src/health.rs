use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use log::warn;

use crate::state::AppState;

/// Store health endpoint: 200 when the configured store answers a ping,
/// otherwise 503 with the store error.
pub async fn store_health(State(state): State<AppState>) -> impl IntoResponse {
	match state.orchestrator.engine().ping().await {
		Ok(()) => (StatusCode::OK, "OK".to_string()).into_response(),
		Err(e) => {
			warn!("store health check failed: {}", e);
			(StatusCode::SERVICE_UNAVAILABLE, format!("store error: {}", e)).into_response()
		}
	}
}

/// Prometheus text exposition of the sync metrics.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
	(
		[(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
		state.metrics.encode(),
	)
}
