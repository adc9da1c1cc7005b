//! Merge-upsert of normalized records into a target store.
//!
//! An `UpsertEngine` hands out one `KindWriter` per namespace and run. The
//! batched strategy stages document writes and commits them once in
//! `finish`; the per-item strategy writes each row immediately and then
//! notifies the translation function.

pub mod batched;
pub mod detect;
pub mod per_item;

use async_trait::async_trait;
use serde::Serialize;

use crate::normalize::{NormalizedRecord, RecordId};
use crate::store::{StoreError, StoredRecord, empty_translations};

pub use batched::BatchedUpsert;
pub use detect::should_skip;
pub use per_item::PerItemUpsert;

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
	Created,
	Updated,
	Skipped,
}

impl UpsertOutcome {
	pub fn as_str(&self) -> &'static str {
		match self {
			UpsertOutcome::Created => "created",
			UpsertOutcome::Updated => "updated",
			UpsertOutcome::Skipped => "skipped",
		}
	}
}

/// Writes the records of one namespace during one sync run.
#[async_trait]
pub trait KindWriter: Send {
	async fn upsert(
		&mut self,
		id: &RecordId,
		normalized: &NormalizedRecord,
	) -> Result<UpsertOutcome, StoreError>;

	/// Flush anything still pending and return the number of writes it
	/// applied. When this fails, none of the `Created`/`Updated` outcomes
	/// reported by this writer took effect.
	async fn finish(&mut self) -> Result<usize, StoreError>;
}

/// Strategy for writing into a particular kind of store.
#[async_trait]
pub trait UpsertEngine: Send + Sync + 'static {
	fn begin(&self, namespace: &str) -> Box<dyn KindWriter>;

	/// Lightweight check that the underlying store is reachable.
	async fn ping(&self) -> Result<(), StoreError>;
}

/// Build the stored payload for `normalized`.
///
/// Translations and the last-translation marker come from `existing` when
/// there is one; a new record starts with an empty translations mapping.
pub fn build_payload(
	existing: Option<&StoredRecord>,
	normalized: &NormalizedRecord,
) -> Result<StoredRecord, StoreError> {
	Ok(StoredRecord {
		original_data: normalized.to_value()?,
		translations: existing
			.map(|e| e.translations.clone())
			.unwrap_or_else(empty_translations),
		last_translated: existing.and_then(|e| e.last_translated.clone()),
		last_updated_source: normalized.last_updated_source().map(str::to_string),
	})
}
