//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use uccelli_sync::normalize::{RecordId, RecordKind};
use uccelli_sync::observability::MetricsRegistry;
use uccelli_sync::source::{ContentSource, SourceFetchError};
use uccelli_sync::store::{
	DocumentStore, DocumentWrite, MemoryDocumentStore, MemoryTableStore, StoreError, StoredRecord,
	TableStore, WriteMode,
};
use uccelli_sync::sync::{Namespaces, SyncOrchestrator};
use uccelli_sync::upsert::{BatchedUpsert, PerItemUpsert};

/// Database URL for Postgres-backed tests, if configured.
/// Prints a skip notice when `UCS_TEST_DATABASE_URL` is unset.
pub fn test_database_url() -> Option<String> {
	match env::var("UCS_TEST_DATABASE_URL") {
		Ok(url) if !url.is_empty() => Some(url),
		_ => {
			eprintln!("Skipping Postgres test; set UCS_TEST_DATABASE_URL to enable");
			None
		}
	}
}

pub fn namespaces() -> Namespaces {
	Namespaces {
		posts: "wordpress_posts".to_string(),
		events: "tribe_events".to_string(),
	}
}

/// Source serving fixed item lists that tests can swap between runs.
#[derive(Default)]
pub struct StaticSource {
	posts: Mutex<Vec<Value>>,
	events: Mutex<Vec<Value>>,
}

impl StaticSource {
	pub fn new(posts: Vec<Value>, events: Vec<Value>) -> Self {
		Self {
			posts: Mutex::new(posts),
			events: Mutex::new(events),
		}
	}

	pub async fn set_posts(&self, posts: Vec<Value>) {
		*self.posts.lock().await = posts;
	}

	pub async fn set_events(&self, events: Vec<Value>) {
		*self.events.lock().await = events;
	}
}

#[async_trait]
impl ContentSource for StaticSource {
	async fn fetch(&self, kind: RecordKind) -> Result<Vec<Value>, SourceFetchError> {
		Ok(match kind {
			RecordKind::Post => self.posts.lock().await.clone(),
			RecordKind::Event => self.events.lock().await.clone(),
		})
	}
}

/// Document store whose commits always fail; reads go to an empty store.
#[derive(Default)]
pub struct RejectingDocumentStore {
	inner: MemoryDocumentStore,
}

#[async_trait]
impl DocumentStore for RejectingDocumentStore {
	async fn get(&self, collection: &str, id: &RecordId) -> Result<Option<Value>, StoreError> {
		self.inner.get(collection, id).await
	}

	async fn commit(&self, _batch: Vec<DocumentWrite>) -> Result<(), StoreError> {
		Err(StoreError::Unavailable("commit rejected".to_string()))
	}

	async fn ping(&self) -> Result<(), StoreError> {
		Err(StoreError::Unavailable("store offline".to_string()))
	}
}

/// Table store that rejects writes for one id and delegates everything else.
pub struct RejectingTableStore {
	pub inner: Arc<MemoryTableStore>,
	reject: RecordId,
}

impl RejectingTableStore {
	pub fn new(reject: &str) -> Self {
		Self {
			inner: Arc::new(MemoryTableStore::new()),
			reject: RecordId::from(reject),
		}
	}
}

#[async_trait]
impl TableStore for RejectingTableStore {
	async fn fetch_row(&self, table: &str, id: &RecordId) -> Result<Option<StoredRecord>, StoreError> {
		self.inner.fetch_row(table, id).await
	}

	async fn upsert_row(
		&self,
		table: &str,
		id: &RecordId,
		record: &StoredRecord,
	) -> Result<Value, StoreError> {
		if *id == self.reject {
			return Err(StoreError::Unavailable(format!("row {} rejected", id)));
		}
		self.inner.upsert_row(table, id, record).await
	}

	async fn ping(&self) -> Result<(), StoreError> {
		self.inner.ping().await
	}
}

/// One of the two write strategies over its in-memory store, with the
/// accessors the shared scenarios need.
pub enum Backend {
	Documents(Arc<MemoryDocumentStore>),
	Tables(Arc<MemoryTableStore>),
}

impl Backend {
	pub fn all() -> Vec<Backend> {
		vec![
			Backend::Documents(Arc::new(MemoryDocumentStore::new())),
			Backend::Tables(Arc::new(MemoryTableStore::new())),
		]
	}

	pub fn name(&self) -> &'static str {
		match self {
			Backend::Documents(_) => "documents",
			Backend::Tables(_) => "tables",
		}
	}

	pub fn orchestrator(&self, source: Arc<StaticSource>) -> SyncOrchestrator {
		let metrics = Arc::new(MetricsRegistry::new().expect("metrics"));
		match self {
			Backend::Documents(store) => SyncOrchestrator::new(
				source,
				Arc::new(BatchedUpsert::new(store.clone())),
				namespaces(),
				metrics,
			),
			Backend::Tables(store) => SyncOrchestrator::new(
				source,
				Arc::new(PerItemUpsert::new(store.clone()).with_metrics(metrics.clone())),
				namespaces(),
				metrics,
			),
		}
	}

	pub async fn stored(&self, namespace: &str, id: &str) -> Option<StoredRecord> {
		let id = RecordId::from(id);
		match self {
			Backend::Documents(store) => store
				.get(namespace, &id)
				.await
				.expect("read document")
				.map(|doc| StoredRecord::from_document(&doc)),
			Backend::Tables(store) => store.fetch_row(namespace, &id).await.expect("read row"),
		}
	}

	/// Write translation data the way the translation process does.
	pub async fn translate(&self, namespace: &str, id: &str, translations: Value, at: Value) {
		let id = RecordId::from(id);
		match self {
			Backend::Documents(store) => {
				store
					.put(
						namespace,
						&id,
						serde_json::json!({"translations": translations, "last_translated": at}),
						WriteMode::Merge,
					)
					.await
			}
			Backend::Tables(store) => {
				assert!(store.record_translation(namespace, &id, translations, Some(at)).await);
			}
		}
	}
}
