//! Total accessors over loosely structured source JSON.
//!
//! Every accessor maps "absent" and "explicit null" to `None` (or `null`), so
//! a normalization rule built from them can never fail on missing data. The
//! typed accessors also reject values of the wrong type; the `_or_raw`
//! variants keep such values as delivered instead.
//! Paths are slices of object keys; a segment that parses as an integer
//! indexes into an array.

use serde_json::Value;

/// Value at `path`, treating JSON `null` the same as absence.
pub fn at<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
	let mut current = raw;
	for segment in path {
		current = match current {
			Value::Object(map) => map.get(*segment)?,
			Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
			_ => return None,
		};
	}
	(!current.is_null()).then_some(current)
}

/// Text at `path`. Numbers and booleans are rendered; containers are rejected.
pub fn text(raw: &Value, path: &[&str]) -> Option<String> {
	match at(raw, path)? {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

/// First non-empty string among `keys` (top-level only).
pub fn first_text<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a str> {
	keys.iter()
		.filter_map(|k| at(raw, &[k]).and_then(Value::as_str))
		.find(|s| !s.is_empty())
}

/// Integer at `path`; numeric strings and integral floats are accepted.
pub fn integer(raw: &Value, path: &[&str]) -> Option<i64> {
	match at(raw, path)? {
		Value::Number(n) => n
			.as_i64()
			.or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

/// Float at `path`; numeric strings are accepted.
pub fn float(raw: &Value, path: &[&str]) -> Option<f64> {
	match at(raw, path)? {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

/// Boolean at `path`; the strings `"true"` and `"false"` are accepted.
pub fn flag(raw: &Value, path: &[&str]) -> Option<bool> {
	match at(raw, path)? {
		Value::Bool(b) => Some(*b),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

/// Integer at `path` if it reads as one, otherwise the value as delivered.
pub fn integer_or_raw(raw: &Value, path: &[&str]) -> Value {
	match integer(raw, path) {
		Some(n) => Value::from(n),
		None => at(raw, path).cloned().unwrap_or(Value::Null),
	}
}

/// Boolean at `path` if it reads as one, otherwise the value as delivered.
pub fn flag_or_raw(raw: &Value, path: &[&str]) -> Value {
	match flag(raw, path) {
		Some(b) => Value::Bool(b),
		None => at(raw, path).cloned().unwrap_or(Value::Null),
	}
}

/// List at `path`. Anything that is not a JSON array yields `None`.
pub fn list<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
	at(raw, path)?.as_array()
}

/// Object at `path`. Tribe sends `[]` for "no venue", which is rejected here.
pub fn object<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
	at(raw, path).filter(|v| v.is_object())
}
