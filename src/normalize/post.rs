use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields::{at, first_text, flag_or_raw, integer_or_raw, list, text};

/// A WordPress post projected onto the stored schema.
///
/// Every field is always serialized; absent source values become `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
	/// Identifier as delivered by the source (a number for WordPress).
	pub id: Value,
	pub date: Option<String>,
	pub modified: Option<String>,
	pub slug: Option<String>,
	pub status: Option<String>,
	#[serde(rename = "type")]
	pub post_type: Option<String>,
	pub link: Option<String>,
	pub title: Option<String>,
	pub content: Option<String>,
	pub excerpt: Option<String>,
	pub author: Value,
	pub featured_media: Value,
	pub comment_status: Option<String>,
	pub ping_status: Option<String>,
	pub sticky: Value,
	pub template: Option<String>,
	pub format: Option<String>,
	pub categories: Option<Vec<Value>>,
	pub tags: Option<Vec<Value>>,
	pub featured_media_url: Option<String>,
	pub last_updated_source: Option<String>,
}

impl PostRecord {
	pub fn from_raw(raw: &Value) -> Self {
		Self {
			id: at(raw, &["id"]).cloned().unwrap_or(Value::Null),
			date: text(raw, &["date"]),
			modified: text(raw, &["modified"]),
			slug: text(raw, &["slug"]),
			status: text(raw, &["status"]),
			post_type: text(raw, &["type"]),
			link: text(raw, &["link"]),
			title: text(raw, &["title", "rendered"]),
			content: text(raw, &["content", "rendered"]),
			excerpt: text(raw, &["excerpt", "rendered"]),
			author: integer_or_raw(raw, &["author"]),
			featured_media: integer_or_raw(raw, &["featured_media"]),
			comment_status: text(raw, &["comment_status"]),
			ping_status: text(raw, &["ping_status"]),
			sticky: flag_or_raw(raw, &["sticky"]),
			template: text(raw, &["template"]),
			format: text(raw, &["format"]),
			categories: list(raw, &["categories"]).cloned(),
			tags: list(raw, &["tags"]).cloned(),
			featured_media_url: text(raw, &["_embedded", "wp:featuredmedia", "0", "source_url"]),
			last_updated_source: first_text(raw, &["modified", "date"]).map(str::to_string),
		}
	}
}
