//! Projection of raw source items onto the stable stored schema.
//!
//! `normalize` is pure: it never performs I/O and never fails. Fields the
//! source omits are materialized as explicit `null`s so that a merge-write
//! never sees an "absent" field where the schema declares one.

pub mod event;
pub mod fields;
pub mod post;

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use event::{EventCategory, EventRecord, Organizer, Venue};
pub use post::PostRecord;

/// The record categories handled by the sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
	Post,
	Event,
}

impl RecordKind {
	pub const ALL: [RecordKind; 2] = [RecordKind::Post, RecordKind::Event];

	pub fn as_str(&self) -> &'static str {
		match self {
			RecordKind::Post => "post",
			RecordKind::Event => "event",
		}
	}
}

impl fmt::Display for RecordKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown record kind '{0}'")]
pub struct UnknownKindError(pub String);

impl FromStr for RecordKind {
	type Err = UnknownKindError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"post" | "posts" => Ok(RecordKind::Post),
			"event" | "events" => Ok(RecordKind::Event),
			other => Err(UnknownKindError(other.to_string())),
		}
	}
}

/// A raw item lacks an identifier usable as a document key.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("record has no usable 'id' field")]
pub struct MissingIdError;

/// Key of a stored record within its namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for RecordId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for RecordId {
	fn from(s: &str) -> Self {
		RecordId(s.to_string())
	}
}

/// Resolve the document key of a raw item. Numbers and non-empty strings
/// qualify and are used exactly as rendered, surrounding whitespace
/// included; anything else (absent, null, empty, containers) does not.
pub fn resolve_id(raw: &Value) -> Result<RecordId, MissingIdError> {
	match fields::at(raw, &["id"]) {
		Some(Value::Number(n)) => Ok(RecordId(n.to_string())),
		Some(Value::String(s)) if !s.is_empty() => Ok(RecordId(s.clone())),
		_ => Err(MissingIdError),
	}
}

/// The cleaned projection of one raw item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedRecord {
	Post(PostRecord),
	Event(EventRecord),
	/// Raw item kept verbatim because no mapping table exists for its kind.
	Passthrough(Value),
}

impl NormalizedRecord {
	/// The source's own modification marker: `modified`, else `date`.
	pub fn last_updated_source(&self) -> Option<&str> {
		match self {
			NormalizedRecord::Post(p) => p.last_updated_source.as_deref(),
			NormalizedRecord::Event(e) => e.last_updated_source.as_deref(),
			NormalizedRecord::Passthrough(raw) => fields::first_text(raw, &["modified", "date"]),
		}
	}

	pub fn to_value(&self) -> Result<Value, serde_json::Error> {
		serde_json::to_value(self)
	}
}

/// Normalize a raw item of a known kind.
pub fn normalize(raw: &Value, kind: RecordKind) -> NormalizedRecord {
	match kind {
		RecordKind::Post => NormalizedRecord::Post(PostRecord::from_raw(raw)),
		RecordKind::Event => NormalizedRecord::Event(EventRecord::from_raw(raw)),
	}
}

/// Normalize by kind name. Unknown names are logged and the raw item is
/// passed through unchanged.
pub fn normalize_named(raw: &Value, kind: &str) -> NormalizedRecord {
	match kind.parse::<RecordKind>() {
		Ok(kind) => normalize(raw, kind),
		Err(e) => {
			warn!("{}; storing raw item unchanged", e);
			NormalizedRecord::Passthrough(raw.clone())
		}
	}
}
