use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error};

use super::{KindWriter, UpsertEngine, UpsertOutcome, build_payload, should_skip};
use crate::normalize::{NormalizedRecord, RecordId};
use crate::observability::MetricsRegistry;
use crate::store::{StoreError, TableStore};
use crate::translate::TranslationTrigger;

/// Upserts each record as its own unit of work, then calls the translation
/// trigger (if any) with the row as written.
pub struct PerItemUpsert {
	store: Arc<dyn TableStore>,
	trigger: Option<Arc<dyn TranslationTrigger>>,
	metrics: Option<Arc<MetricsRegistry>>,
}

impl PerItemUpsert {
	pub fn new(store: Arc<dyn TableStore>) -> Self {
		Self {
			store,
			trigger: None,
			metrics: None,
		}
	}

	pub fn with_trigger(mut self, trigger: Arc<dyn TranslationTrigger>) -> Self {
		self.trigger = Some(trigger);
		self
	}

	pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
		self.metrics = Some(metrics);
		self
	}
}

#[async_trait]
impl UpsertEngine for PerItemUpsert {
	fn begin(&self, namespace: &str) -> Box<dyn KindWriter> {
		Box::new(PerItemWriter {
			store: self.store.clone(),
			trigger: self.trigger.clone(),
			metrics: self.metrics.clone(),
			table: namespace.to_string(),
		})
	}

	async fn ping(&self) -> Result<(), StoreError> {
		self.store.ping().await
	}
}

struct PerItemWriter {
	store: Arc<dyn TableStore>,
	trigger: Option<Arc<dyn TranslationTrigger>>,
	metrics: Option<Arc<MetricsRegistry>>,
	table: String,
}

impl PerItemWriter {
	async fn notify(&self, id: &RecordId, row: &serde_json::Value) {
		let Some(trigger) = &self.trigger else {
			return;
		};
		if let Some(m) = &self.metrics {
			m.translation_triggers_total.inc();
		}
		if let Err(e) = trigger.trigger(&self.table, row).await {
			error!("translation trigger for {} {} failed: {}", self.table, id, e);
			if let Some(m) = &self.metrics {
				m.translation_trigger_failures_total.inc();
			}
		}
	}
}

#[async_trait]
impl KindWriter for PerItemWriter {
	async fn upsert(
		&mut self,
		id: &RecordId,
		normalized: &NormalizedRecord,
	) -> Result<UpsertOutcome, StoreError> {
		let existing = self.store.fetch_row(&self.table, id).await?;

		if should_skip(existing.as_ref(), normalized) {
			debug!("{} {} unchanged at source; skipping", self.table, id);
			return Ok(UpsertOutcome::Skipped);
		}

		let payload = build_payload(existing.as_ref(), normalized)?;
		let row = self.store.upsert_row(&self.table, id, &payload).await?;
		let outcome = match existing {
			Some(_) => UpsertOutcome::Updated,
			None => UpsertOutcome::Created,
		};
		debug!("{} {} {}", self.table, id, outcome.as_str());

		// Trigger failures never change the outcome of the write.
		self.notify(id, &row).await;
		Ok(outcome)
	}

	async fn finish(&mut self) -> Result<usize, StoreError> {
		Ok(0)
	}
}
