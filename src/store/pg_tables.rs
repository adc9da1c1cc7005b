use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;

use super::{StoreError, StoredRecord, TableStore, sanitize_identifier};
use crate::normalize::RecordId;

/// One PostgreSQL table per record kind, keyed by the source id.
pub struct PgTableStore {
	pool: PgPool,
}

impl PgTableStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
		let pool = PgPool::connect(database_url).await?;
		Ok(Self::new(pool))
	}

	/// Create any of `tables` that do not exist yet.
	pub async fn ensure_tables(&self, tables: &[&str]) -> Result<(), StoreError> {
		for table in tables {
			let table = sanitize_identifier(table)?;
			let sql = format!(
				"CREATE TABLE IF NOT EXISTS {table} (
					id TEXT PRIMARY KEY,
					original_data JSONB NOT NULL,
					translations JSONB NOT NULL DEFAULT '{{}}'::jsonb,
					last_translated TEXT,
					last_updated_source TEXT,
					synced_at TIMESTAMPTZ NOT NULL DEFAULT now()
				)"
			);
			sqlx::query(&sql).execute(&self.pool).await?;
		}
		Ok(())
	}
}

#[async_trait]
impl TableStore for PgTableStore {
	async fn fetch_row(&self, table: &str, id: &RecordId) -> Result<Option<StoredRecord>, StoreError> {
		let table = sanitize_identifier(table)?;
		let sql = format!(
			"SELECT original_data, translations, last_translated, last_updated_source FROM {table} WHERE id = $1"
		);
		let row = sqlx::query_as::<_, (Json<Value>, Json<Value>, Option<String>, Option<String>)>(&sql)
			.bind(id.as_str())
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.map(
			|(Json(original_data), Json(translations), last_translated, last_updated_source)| {
				StoredRecord {
					original_data,
					translations,
					last_translated: last_translated.map(Value::String),
					last_updated_source,
				}
			},
		))
	}

	async fn upsert_row(
		&self,
		table: &str,
		id: &RecordId,
		record: &StoredRecord,
	) -> Result<Value, StoreError> {
		let table = sanitize_identifier(table)?;
		// translations is only written on insert; last_translated never.
		let sql = format!(
			"INSERT INTO {table} AS t (id, original_data, translations, last_updated_source, synced_at)
			VALUES ($1, $2, $3, $4, now())
			ON CONFLICT (id) DO UPDATE SET
				original_data = EXCLUDED.original_data,
				last_updated_source = EXCLUDED.last_updated_source,
				synced_at = now()
			RETURNING to_jsonb(t)"
		);
		let Json(row) = sqlx::query_scalar::<_, Json<Value>>(&sql)
			.bind(id.as_str())
			.bind(Json(&record.original_data))
			.bind(Json(&record.translations))
			.bind(record.last_updated_source.as_deref())
			.fetch_one(&self.pool)
			.await?;
		Ok(row)
	}

	async fn ping(&self) -> Result<(), StoreError> {
		sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
		Ok(())
	}
}
