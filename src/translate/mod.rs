//! Fire-and-forget call into the downstream translation function.
//!
//! The payload imitates a database change notification so the translation
//! function can treat a sync-triggered call like a row update.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum TriggerCallError {
	#[error("translation request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("translation endpoint answered {status}: {body}")]
	Status { status: StatusCode, body: String },
}

/// Body sent to the translation function.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TriggerPayload<'a> {
	pub record: &'a Value,
	pub old_record: Option<&'a Value>,
	pub event: &'static str,
	pub table: &'a str,
	pub schema: &'static str,
}

impl<'a> TriggerPayload<'a> {
	/// Payload for a row the sync just wrote.
	pub fn update(table: &'a str, record: &'a Value) -> Self {
		Self {
			record,
			old_record: None,
			event: "UPDATE",
			table,
			schema: "public",
		}
	}
}

#[async_trait]
pub trait TranslationTrigger: Send + Sync + 'static {
	async fn trigger(&self, table: &str, record: &Value) -> Result<(), TriggerCallError>;
}

/// Calls the translation function over HTTPS with a bearer token.
pub struct HttpTranslationTrigger {
	client: reqwest::Client,
	url: Url,
	token: Option<String>,
}

impl HttpTranslationTrigger {
	pub fn new(url: Url, token: Option<String>, timeout: Duration) -> Result<Self, TriggerCallError> {
		let client = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self { client, url, token })
	}
}

#[async_trait]
impl TranslationTrigger for HttpTranslationTrigger {
	async fn trigger(&self, table: &str, record: &Value) -> Result<(), TriggerCallError> {
		let mut request = self
			.client
			.post(self.url.clone())
			.json(&TriggerPayload::update(table, record));
		if let Some(token) = &self.token {
			request = request.bearer_auth(token);
		}

		let response = request.send().await?;
		let status = response.status();
		let body = response.text().await.unwrap_or_default();

		if status != StatusCode::OK {
			return Err(TriggerCallError::Status { status, body });
		}

		info!("translation triggered for {} row {}", table, record.get("id").unwrap_or(&Value::Null));
		debug!("translation response: {}", body);
		Ok(())
	}
}
