use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;

use super::{DocumentStore, DocumentWrite, StoreError, WriteMode};
use crate::normalize::RecordId;

const DOCUMENTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS documents (
	collection TEXT NOT NULL,
	id TEXT NOT NULL,
	data JSONB NOT NULL,
	updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	PRIMARY KEY (collection, id)
)";

// A create that finds a document replaces it, except for the fields the
// translation process owns.
const CREATE_DOCUMENT: &str = "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)
	ON CONFLICT (collection, id) DO UPDATE SET
		data = EXCLUDED.data || (
			SELECT coalesce(jsonb_object_agg(key, value), '{}'::jsonb)
			FROM jsonb_each(documents.data)
			WHERE key IN ('translations', 'last_translated') AND value <> 'null'::jsonb
		),
		updated_at = now()";

// `||` on JSONB objects replaces top-level keys of the left operand only.
const MERGE_DOCUMENT: &str = "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)
	ON CONFLICT (collection, id) DO UPDATE SET data = documents.data || EXCLUDED.data, updated_at = now()";

/// Document collections kept as JSONB rows in PostgreSQL.
pub struct PgDocumentStore {
	pool: PgPool,
}

impl PgDocumentStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	/// Connect helper using a DATABASE_URL-like string
	pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
		let pool = PgPool::connect(database_url).await?;
		Ok(Self::new(pool))
	}

	pub async fn ensure_schema(&self) -> Result<(), StoreError> {
		sqlx::query(DOCUMENTS_TABLE).execute(&self.pool).await?;
		Ok(())
	}
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
	async fn get(&self, collection: &str, id: &RecordId) -> Result<Option<Value>, StoreError> {
		let row = sqlx::query_scalar::<_, Json<Value>>(
			"SELECT data FROM documents WHERE collection = $1 AND id = $2",
		)
		.bind(collection)
		.bind(id.as_str())
		.fetch_optional(&self.pool)
		.await?;
		Ok(row.map(|Json(doc)| doc))
	}

	async fn commit(&self, batch: Vec<DocumentWrite>) -> Result<(), StoreError> {
		if batch.is_empty() {
			return Ok(());
		}

		// Dropping the transaction without commit rolls everything back.
		let mut tx = self.pool.begin().await?;
		for write in &batch {
			let sql = match write.mode {
				WriteMode::Create => CREATE_DOCUMENT,
				WriteMode::Merge => MERGE_DOCUMENT,
			};
			sqlx::query(sql)
				.bind(&write.collection)
				.bind(write.id.as_str())
				.bind(Json(&write.data))
				.execute(&mut *tx)
				.await?;
		}
		tx.commit().await?;
		Ok(())
	}

	async fn ping(&self) -> Result<(), StoreError> {
		sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
		Ok(())
	}
}
