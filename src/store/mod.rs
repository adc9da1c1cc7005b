//! Target stores and the persisted record shape.
//!
//! Two store families are supported: a document store addressed by
//! `(collection, id)` with atomic multi-document batches and merge-writes,
//! and a relational store addressed by `(table, id)` with upsert-on-conflict.
//! Both are traits so the sync can run against PostgreSQL or the in-process
//! implementations.

pub mod memory;
pub mod pg_documents;
pub mod pg_tables;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::normalize::RecordId;

pub use memory::{MemoryDocumentStore, MemoryTableStore};
pub use pg_documents::PgDocumentStore;
pub use pg_tables::PgTableStore;

/// A store rejected a read or write.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("invalid identifier '{0}'")]
	InvalidIdentifier(String),

	#[error("store unavailable: {0}")]
	Unavailable(String),
}

/// Persisted representation of one synced record.
///
/// `original_data` and `last_updated_source` belong to the sync.
/// `translations` and `last_translated` belong to the translation process;
/// the sync only ever initializes `translations` to `{}` on creation and
/// otherwise carries both forward untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
	pub original_data: Value,
	pub translations: Value,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_translated: Option<Value>,
	pub last_updated_source: Option<String>,
}

/// Top-level document fields owned by the translation process.
pub const DOWNSTREAM_FIELDS: [&str; 2] = ["translations", "last_translated"];

pub fn empty_translations() -> Value {
	Value::Object(Map::new())
}

impl StoredRecord {
	/// Read a stored document leniently: missing or null translations read as
	/// an empty mapping, anything else is kept verbatim.
	pub fn from_document(doc: &Value) -> Self {
		let present = |key: &str| doc.get(key).filter(|v| !v.is_null()).cloned();
		Self {
			original_data: present("original_data").unwrap_or(Value::Null),
			translations: present("translations").unwrap_or_else(empty_translations),
			last_translated: present("last_translated"),
			last_updated_source: doc
				.get("last_updated_source")
				.and_then(Value::as_str)
				.map(str::to_string),
		}
	}

	pub fn to_document(&self) -> Result<Value, StoreError> {
		Ok(serde_json::to_value(self)?)
	}

	/// The sync-owned fields only, for merging into an existing document.
	pub fn to_sync_patch(&self) -> Result<Value, StoreError> {
		let mut doc = self.to_document()?;
		strip_downstream(&mut doc);
		Ok(doc)
	}

	/// The change marker recorded by the last sync. Rows written by older
	/// tooling only carry it inside `original_data`.
	pub fn source_marker(&self) -> Option<&str> {
		self.last_updated_source
			.as_deref()
			.or_else(|| self.original_data.get("last_updated_source")?.as_str())
			.filter(|s| !s.is_empty())
	}
}

/// How a document write treats an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
	/// Insert the document. If one appeared since it was read, replace it
	/// but keep its downstream-owned fields.
	Create,
	/// Overwrite only the top-level fields present in the payload.
	Merge,
}

/// One staged write in a document batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWrite {
	pub collection: String,
	pub id: RecordId,
	pub data: Value,
	pub mode: WriteMode,
}

/// Document-oriented store with atomic batches.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
	async fn get(&self, collection: &str, id: &RecordId) -> Result<Option<Value>, StoreError>;
	/// Apply every write or none of them, in order.
	async fn commit(&self, batch: Vec<DocumentWrite>) -> Result<(), StoreError>;
	/// Lightweight check that the store is reachable.
	async fn ping(&self) -> Result<(), StoreError>;
}

/// Relational store with one row per record and upsert-on-conflict.
#[async_trait]
pub trait TableStore: Send + Sync + 'static {
	async fn fetch_row(&self, table: &str, id: &RecordId) -> Result<Option<StoredRecord>, StoreError>;
	/// Insert the record, or on conflict update only the sync-owned columns
	/// (`original_data`, `last_updated_source`). Returns the row as written.
	async fn upsert_row(
		&self,
		table: &str,
		id: &RecordId,
		record: &StoredRecord,
	) -> Result<Value, StoreError>;
	async fn ping(&self) -> Result<(), StoreError>;
}

/// Shallow merge of `patch` into `target`: top-level keys of `patch` replace
/// those of `target`, every other key of `target` is left as it was.
pub fn merge_fields(target: &mut Value, patch: &Value) {
	match (target.as_object_mut(), patch.as_object()) {
		(Some(t), Some(p)) => {
			for (k, v) in p {
				t.insert(k.clone(), v.clone());
			}
		}
		_ => *target = patch.clone(),
	}
}

/// Remove the downstream-owned fields from a document.
pub fn strip_downstream(doc: &mut Value) {
	if let Some(fields) = doc.as_object_mut() {
		for key in DOWNSTREAM_FIELDS {
			fields.remove(key);
		}
	}
}

/// `data` as the replacement for `existing`, with every downstream-owned
/// field `existing` has carried over.
pub fn keep_downstream(existing: &Value, mut data: Value) -> Value {
	if let Some(fields) = data.as_object_mut() {
		for key in DOWNSTREAM_FIELDS {
			if let Some(v) = existing.get(key).filter(|v| !v.is_null()) {
				fields.insert(key.to_string(), v.clone());
			}
		}
	}
	data
}

/// Validate a table or collection name for interpolation into SQL.
/// Only ASCII alphanumerics and `_` are allowed, and it may not start with a
/// digit.
pub fn sanitize_identifier(name: &str) -> Result<&str, StoreError> {
	let valid = !name.is_empty()
		&& name.len() <= 63
		&& !name.starts_with(|c: char| c.is_ascii_digit())
		&& name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
	if valid {
		Ok(name)
	} else {
		Err(StoreError::InvalidIdentifier(name.to_string()))
	}
}
