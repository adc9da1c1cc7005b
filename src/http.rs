//! HTTP trigger for on-demand syncs.

use std::net::SocketAddr;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use log::info;

use crate::health::{metrics_handler, store_health};
use crate::state::AppState;
use crate::sync::SyncReport;

/// `GET|POST /sync` runs both kinds and answers with the report.
pub async fn sync_now(State(state): State<AppState>) -> Json<SyncReport> {
	info!("sync requested over HTTP");
	Json(state.orchestrator.sync_all().await)
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/sync", get(sync_now).post(sync_now))
		.route("/health", get(|| async { "ok" }))
		.route("/health/store", get(store_health))
		.route("/metrics", get(metrics_handler))
		.with_state(state)
}

/// Serve the trigger endpoints until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
	let listener = tokio::net::TcpListener::bind(addr).await?;
	info!("listening on http://{} (GET|POST /sync, /health, /metrics)", addr);
	axum::serve(listener, router(state))
		.with_graceful_shutdown(async {
			let _ = tokio::signal::ctrl_c().await;
			info!("shutting down");
		})
		.await?;
	Ok(())
}
