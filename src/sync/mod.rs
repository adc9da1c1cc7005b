//! Drives fetch -> normalize -> detect -> upsert for each record kind.

pub mod report;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use crate::normalize::{RecordKind, normalize, resolve_id};
use crate::observability::MetricsRegistry;
use crate::source::{ContentSource, or_empty};
use crate::upsert::UpsertEngine;

pub use report::{KindTally, SyncReport, Totals};

/// Target namespace (collection or table) per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
	pub posts: String,
	pub events: String,
}

impl Namespaces {
	pub fn for_kind(&self, kind: RecordKind) -> &str {
		match kind {
			RecordKind::Post => &self.posts,
			RecordKind::Event => &self.events,
		}
	}
}

/// Runs sync passes. Collaborators are injected once and shared between
/// runs. Full runs are serialized; a request that arrives during a run waits
/// for it to finish.
pub struct SyncOrchestrator {
	source: Arc<dyn ContentSource>,
	engine: Arc<dyn UpsertEngine>,
	namespaces: Namespaces,
	metrics: Arc<MetricsRegistry>,
	running: Mutex<()>,
}

impl SyncOrchestrator {
	pub fn new(
		source: Arc<dyn ContentSource>,
		engine: Arc<dyn UpsertEngine>,
		namespaces: Namespaces,
		metrics: Arc<MetricsRegistry>,
	) -> Self {
		Self {
			source,
			engine,
			namespaces,
			metrics,
			running: Mutex::new(()),
		}
	}

	pub fn engine(&self) -> &Arc<dyn UpsertEngine> {
		&self.engine
	}

	/// Sync both kinds. Never fails: every error ends up in the tallies.
	pub async fn sync_all(&self) -> SyncReport {
		let _running = self.running.lock().await;
		let started_at = Utc::now();
		let timer = Instant::now();
		self.metrics.sync_runs_total.inc();
		info!("sync started");

		let posts = self.sync_kind(RecordKind::Post).await;
		let events = self.sync_kind(RecordKind::Event).await;

		self.metrics
			.sync_duration_seconds
			.observe(timer.elapsed().as_secs_f64());
		let report = SyncReport {
			started_at,
			finished_at: Utc::now(),
			posts,
			events,
		};
		let totals = report.totals();
		info!(
			"sync finished: fetched={} created={} updated={} skipped={} failed={} missing_id={}",
			totals.items_fetched,
			totals.created,
			totals.updated,
			totals.skipped,
			totals.failed,
			totals.missing_id
		);
		report
	}

	/// Sync a single kind.
	pub async fn sync_kind(&self, kind: RecordKind) -> KindTally {
		let namespace = self.namespaces.for_kind(kind);
		let mut tally = KindTally::new(kind, namespace);

		info!("fetching {} items", kind);
		let fetched = self.source.fetch(kind).await;
		if fetched.is_err() {
			self.metrics
				.source_fetch_failures_total
				.with_label_values(&[kind.as_str()])
				.inc();
		}
		let items = or_empty(kind, fetched);
		tally.items_fetched = items.len();
		self.metrics
			.items_fetched_total
			.with_label_values(&[kind.as_str()])
			.inc_by(items.len() as u64);
		info!("fetched {} {} items", items.len(), kind);

		let mut writer = self.engine.begin(namespace);
		for raw in &items {
			let id = match resolve_id(raw) {
				Ok(id) => id,
				Err(e) => {
					warn!("{} item in '{}' skipped: {}", kind, namespace, e);
					debug!("item without id: {}", raw);
					tally.missing_id += 1;
					continue;
				}
			};

			let normalized = normalize(raw, kind);
			match writer.upsert(&id, &normalized).await {
				Ok(outcome) => tally.record(outcome),
				Err(e) => {
					error!("failed to sync {} {} into '{}': {}", kind, id, namespace, e);
					tally.failed += 1;
				}
			}
		}

		match writer.finish().await {
			Ok(0) => {}
			Ok(_) => self.metrics.batch_commits_total.inc(),
			Err(e) => {
				error!(
					"batch for '{}' failed, {} staged writes discarded: {}",
					namespace,
					tally.written(),
					e
				);
				self.metrics.batch_failures_total.inc();
				tally.fail_staged();
			}
		}

		let label = kind.as_str();
		self.metrics.record_outcome(label, "created", tally.created as u64);
		self.metrics.record_outcome(label, "updated", tally.updated as u64);
		self.metrics.record_outcome(label, "skipped", tally.skipped as u64);
		self.metrics.record_outcome(label, "failed", tally.failed as u64);
		self.metrics.record_outcome(label, "missing_id", tally.missing_id as u64);

		tally
	}
}
