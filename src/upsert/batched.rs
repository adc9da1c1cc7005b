use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use super::{KindWriter, UpsertEngine, UpsertOutcome, build_payload, should_skip};
use crate::normalize::{NormalizedRecord, RecordId};
use crate::store::{DocumentStore, DocumentWrite, StoreError, StoredRecord, WriteMode};

/// Stages every write of a namespace and commits them as one atomic batch.
pub struct BatchedUpsert {
	store: Arc<dyn DocumentStore>,
}

impl BatchedUpsert {
	pub fn new(store: Arc<dyn DocumentStore>) -> Self {
		Self { store }
	}
}

#[async_trait]
impl UpsertEngine for BatchedUpsert {
	fn begin(&self, namespace: &str) -> Box<dyn KindWriter> {
		Box::new(BatchedWriter {
			store: self.store.clone(),
			collection: namespace.to_string(),
			pending: Vec::new(),
			staged: HashMap::new(),
		})
	}

	async fn ping(&self) -> Result<(), StoreError> {
		self.store.ping().await
	}
}

struct BatchedWriter {
	store: Arc<dyn DocumentStore>,
	collection: String,
	pending: Vec<DocumentWrite>,
	// id -> index into `pending`
	staged: HashMap<RecordId, usize>,
}

#[async_trait]
impl KindWriter for BatchedWriter {
	async fn upsert(
		&mut self,
		id: &RecordId,
		normalized: &NormalizedRecord,
	) -> Result<UpsertOutcome, StoreError> {
		let existing = self
			.store
			.get(&self.collection, id)
			.await?
			.map(|doc| StoredRecord::from_document(&doc));

		if should_skip(existing.as_ref(), normalized) {
			debug!("{} {} unchanged at source; skipping", self.collection, id);
			return Ok(UpsertOutcome::Skipped);
		}

		// The commit happens later; the translation fields read now may be
		// stale by then, so updates only carry the sync-owned fields.
		let payload = build_payload(existing.as_ref(), normalized)?;
		let (data, mode, outcome) = match existing {
			Some(_) => (payload.to_sync_patch()?, WriteMode::Merge, UpsertOutcome::Updated),
			None => (payload.to_document()?, WriteMode::Create, UpsertOutcome::Created),
		};

		// The source listed the same id twice; the later item wins.
		if let Some(&index) = self.staged.get(id) {
			self.pending[index].data = data;
			return Ok(UpsertOutcome::Updated);
		}

		debug!("{} {} staged for {}", self.collection, id, outcome.as_str());
		self.staged.insert(id.clone(), self.pending.len());
		self.pending.push(DocumentWrite {
			collection: self.collection.clone(),
			id: id.clone(),
			data,
			mode,
		});
		Ok(outcome)
	}

	async fn finish(&mut self) -> Result<usize, StoreError> {
		self.staged.clear();
		let batch = std::mem::take(&mut self.pending);
		if batch.is_empty() {
			info!("no writes required for {}", self.collection);
			return Ok(0);
		}

		let count = batch.len();
		self.store.commit(batch).await?;
		info!("batch for {} committed: {} writes", self.collection, count);
		Ok(count)
	}
}
