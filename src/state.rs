use std::sync::Arc;

use crate::observability::MetricsRegistry;
use crate::sync::SyncOrchestrator;

/// Application state passed to handlers via Axum's `State` extractor.
///
/// The orchestrator is built once at startup; every `/sync` request runs a
/// fresh pass through it.
#[derive(Clone)]
pub struct AppState {
	pub orchestrator: Arc<SyncOrchestrator>,
	pub metrics: Arc<MetricsRegistry>,
}
