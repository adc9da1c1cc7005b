use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use super::{
	DocumentStore, DocumentWrite, StoreError, StoredRecord, TableStore, WriteMode, keep_downstream,
	merge_fields,
};
use crate::normalize::RecordId;

type Key = (String, String);

fn key(namespace: &str, id: &RecordId) -> Key {
	(namespace.to_string(), id.as_str().to_string())
}

/// In-process document store. Batches are applied under a single write lock,
/// so a commit is atomic with respect to readers.
#[derive(Default)]
pub struct MemoryDocumentStore {
	docs: RwLock<HashMap<Key, Value>>,
	commits: AtomicU64,
}

impl MemoryDocumentStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of batches committed so far.
	pub fn commit_count(&self) -> u64 {
		self.commits.load(Ordering::Relaxed)
	}

	pub async fn len(&self) -> usize {
		self.docs.read().await.len()
	}

	/// Write a document outside of any batch, as another writer would.
	pub async fn put(&self, collection: &str, id: &RecordId, data: Value, mode: WriteMode) {
		let mut docs = self.docs.write().await;
		apply(&mut docs, key(collection, id), data, mode);
	}
}

fn apply(docs: &mut HashMap<Key, Value>, key: Key, data: Value, mode: WriteMode) {
	match (mode, docs.get_mut(&key)) {
		(WriteMode::Merge, Some(existing)) => merge_fields(existing, &data),
		(WriteMode::Create, Some(existing)) => *existing = keep_downstream(existing, data),
		(_, None) => {
			docs.insert(key, data);
		}
	}
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
	async fn get(&self, collection: &str, id: &RecordId) -> Result<Option<Value>, StoreError> {
		Ok(self.docs.read().await.get(&key(collection, id)).cloned())
	}

	async fn commit(&self, batch: Vec<DocumentWrite>) -> Result<(), StoreError> {
		let mut docs = self.docs.write().await;
		for write in batch {
			apply(&mut docs, key(&write.collection, &write.id), write.data, write.mode);
		}
		self.commits.fetch_add(1, Ordering::Relaxed);
		Ok(())
	}

	async fn ping(&self) -> Result<(), StoreError> {
		Ok(())
	}
}

/// In-process table store with the same conflict rules as `PgTableStore`.
#[derive(Default)]
pub struct MemoryTableStore {
	rows: RwLock<HashMap<Key, StoredRecord>>,
}

impl MemoryTableStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn len(&self) -> usize {
		self.rows.read().await.len()
	}

	/// Record a translation the way the translation process would.
	pub async fn record_translation(
		&self,
		table: &str,
		id: &RecordId,
		translations: Value,
		last_translated: Option<Value>,
	) -> bool {
		match self.rows.write().await.get_mut(&key(table, id)) {
			Some(row) => {
				row.translations = translations;
				row.last_translated = last_translated;
				true
			}
			None => false,
		}
	}
}

fn row_json(id: &RecordId, row: &StoredRecord) -> Value {
	json!({
		"id": id.as_str(),
		"original_data": row.original_data,
		"translations": row.translations,
		"last_translated": row.last_translated,
		"last_updated_source": row.last_updated_source,
	})
}

#[async_trait]
impl TableStore for MemoryTableStore {
	async fn fetch_row(&self, table: &str, id: &RecordId) -> Result<Option<StoredRecord>, StoreError> {
		Ok(self.rows.read().await.get(&key(table, id)).cloned())
	}

	async fn upsert_row(
		&self,
		table: &str,
		id: &RecordId,
		record: &StoredRecord,
	) -> Result<Value, StoreError> {
		let mut rows = self.rows.write().await;
		let row = rows
			.entry(key(table, id))
			.and_modify(|row| {
				row.original_data = record.original_data.clone();
				row.last_updated_source = record.last_updated_source.clone();
			})
			.or_insert_with(|| StoredRecord {
				last_translated: None,
				..record.clone()
			});
		Ok(row_json(id, row))
	}

	async fn ping(&self) -> Result<(), StoreError> {
		Ok(())
	}
}
