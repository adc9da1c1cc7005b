//! Client for the WordPress REST API (posts) and the Tribe Events Calendar
//! API (events).

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::Settings;
use crate::normalize::RecordKind;

/// Errors that can occur while fetching a collection from the source.
#[derive(Debug, Error)]
pub enum SourceFetchError {
	#[error("HTTP request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("HTTP error status: {0}")]
	Status(StatusCode),

	#[error("unexpected response shape: {0}")]
	Shape(String),
}

/// Something that can list raw items of a kind.
#[async_trait]
pub trait ContentSource: Send + Sync + 'static {
	async fn fetch(&self, kind: RecordKind) -> Result<Vec<Value>, SourceFetchError>;

	/// Fail-open variant of `fetch`: any failure is logged and yields no
	/// items, so one unavailable endpoint cannot block the other kind.
	async fn fetch_collection(&self, kind: RecordKind) -> Vec<Value> {
		or_empty(kind, self.fetch(kind).await)
	}
}

/// Degrade a failed fetch to an empty collection, logging why.
pub fn or_empty(kind: RecordKind, fetched: Result<Vec<Value>, SourceFetchError>) -> Vec<Value> {
	match fetched {
		Ok(items) => items,
		Err(SourceFetchError::Shape(detail)) => {
			warn!("{} source returned an unexpected shape: {}", kind, detail);
			Vec::new()
		}
		Err(e) => {
			error!("failed to fetch {} items: {}", kind, e);
			Vec::new()
		}
	}
}

/// HTTP client for both source endpoints.
pub struct WordPressSource {
	client: reqwest::Client,
	posts_url: Url,
	events_url: Url,
	per_page: u32,
	embed: bool,
}

impl WordPressSource {
	pub fn new(
		posts_url: Url,
		events_url: Url,
		per_page: u32,
		embed: bool,
		timeout: Duration,
	) -> Result<Self, SourceFetchError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.user_agent(concat!("uccelli-sync/", env!("CARGO_PKG_VERSION")))
			.build()?;
		Ok(Self {
			client,
			posts_url,
			events_url,
			per_page,
			embed,
		})
	}

	pub fn from_settings(settings: &Settings) -> Result<Self, SourceFetchError> {
		Self::new(
			settings.posts_url.clone(),
			settings.events_url.clone(),
			settings.per_page,
			settings.embed,
			settings.http_timeout(),
		)
	}

	/// The posts URL with the embed flag and page size applied.
	pub fn posts_request_url(&self) -> Url {
		let mut url = self.posts_url.clone();
		{
			let mut query = url.query_pairs_mut();
			if self.embed {
				query.append_key_only("_embed");
			}
			query.append_pair("per_page", &self.per_page.to_string());
		}
		url
	}

	async fn get_json(&self, url: Url) -> Result<Value, SourceFetchError> {
		debug!("GET {}", url);
		let response = self.client.get(url).send().await?;
		let status = response.status();
		if !status.is_success() {
			return Err(SourceFetchError::Status(status));
		}
		Ok(response.json::<Value>().await?)
	}
}

#[async_trait]
impl ContentSource for WordPressSource {
	async fn fetch(&self, kind: RecordKind) -> Result<Vec<Value>, SourceFetchError> {
		match kind {
			RecordKind::Post => match self.get_json(self.posts_request_url()).await? {
				Value::Array(items) => Ok(items),
				_ => Err(SourceFetchError::Shape("posts response is not an array".to_string())),
			},
			RecordKind::Event => match self.get_json(self.events_url.clone()).await? {
				Value::Object(mut body) => match body.remove("events") {
					Some(Value::Array(items)) => Ok(items),
					_ => Err(SourceFetchError::Shape(
						"events response has no 'events' array".to_string(),
					)),
				},
				_ => Err(SourceFetchError::Shape("events response is not an object".to_string())),
			},
		}
	}
}
