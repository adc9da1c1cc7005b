pub mod config;
pub mod health;
pub mod http;
pub mod normalize;
pub mod observability;
pub mod source;
pub mod state;
pub mod store;
pub mod sync;
pub mod translate;
pub mod upsert;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};

use crate::config::{Settings, StoreBackend};
use crate::observability::MetricsRegistry;
use crate::source::WordPressSource;
use crate::state::AppState;
use crate::store::{MemoryDocumentStore, PgDocumentStore, PgTableStore};
use crate::sync::SyncOrchestrator;
use crate::translate::HttpTranslationTrigger;
use crate::upsert::{BatchedUpsert, PerItemUpsert, UpsertEngine};

/// Build the upsert strategy for the configured store, connecting and
/// creating missing tables as needed.
pub async fn build_engine(
	settings: &Settings,
	metrics: &Arc<MetricsRegistry>,
) -> anyhow::Result<Arc<dyn UpsertEngine>> {
	let engine: Arc<dyn UpsertEngine> = match settings.store {
		StoreBackend::Memory => {
			warn!("memory store selected; nothing is persisted beyond this process");
			Arc::new(BatchedUpsert::new(Arc::new(MemoryDocumentStore::new())))
		}
		StoreBackend::Document => {
			let store = PgDocumentStore::connect(settings.database_url.as_str())
				.await
				.context("connecting document store")?;
			store.ensure_schema().await.context("creating documents table")?;
			Arc::new(BatchedUpsert::new(Arc::new(store)))
		}
		StoreBackend::Relational => {
			let store = PgTableStore::connect(settings.database_url.as_str())
				.await
				.context("connecting relational store")?;
			store
				.ensure_tables(&[settings.posts_table.as_str(), settings.events_table.as_str()])
				.await
				.context("creating sync tables")?;

			let mut engine = PerItemUpsert::new(Arc::new(store)).with_metrics(metrics.clone());
			match &settings.translate_url {
				Some(url) => {
					let trigger = HttpTranslationTrigger::new(
						url.clone(),
						settings.translate_token.clone(),
						settings.http_timeout(),
					)?;
					engine = engine.with_trigger(Arc::new(trigger));
				}
				None => info!("no translate_url configured; translation trigger disabled"),
			}
			Arc::new(engine)
		}
	};
	Ok(engine)
}

/// Wire source, engine and metrics into an orchestrator.
pub async fn build_orchestrator(
	settings: &Settings,
	metrics: Arc<MetricsRegistry>,
) -> anyhow::Result<SyncOrchestrator> {
	let source = WordPressSource::from_settings(settings).context("building source client")?;
	let engine = build_engine(settings, &metrics).await?;
	Ok(SyncOrchestrator::new(
		Arc::new(source),
		engine,
		settings.namespaces(),
		metrics,
	))
}

/// Run the HTTP trigger server.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
	let metrics = Arc::new(MetricsRegistry::new()?);
	let orchestrator = Arc::new(build_orchestrator(&settings, metrics.clone()).await?);
	let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
		.parse()
		.with_context(|| format!("invalid listen address {}:{}", settings.host, settings.port))?;

	crate::http::serve(
		addr,
		AppState {
			orchestrator,
			metrics,
		},
	)
	.await
}
