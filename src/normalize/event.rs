use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields::{at, first_text, flag_or_raw, float, integer_or_raw, list, object, text};

/// A Tribe Events Calendar event projected onto the stored schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
	pub id: Value,
	pub title: Option<String>,
	pub description: Option<String>,
	pub excerpt: Option<String>,
	pub url: Option<String>,
	pub start_date: Option<String>,
	pub end_date: Option<String>,
	pub all_day: Value,
	pub venue: Option<Venue>,
	pub organizer: Option<Organizer>,
	pub categories: Option<Vec<EventCategory>>,
	pub last_updated_source: Option<String>,
}

/// Stored under the source's own key names (`venue` holds the venue name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
	pub id: Value,
	#[serde(rename = "venue")]
	pub name: Option<String>,
	pub address: Option<String>,
	pub city: Option<String>,
	pub country: Option<String>,
	pub zip: Option<String>,
	pub state: Option<String>,
	pub website: Option<String>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organizer {
	pub id: Value,
	#[serde(rename = "organizer")]
	pub name: Option<String>,
	pub phone: Option<String>,
	pub website: Option<String>,
	pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCategory {
	pub id: Value,
	pub name: Option<String>,
	pub slug: Option<String>,
}

impl EventRecord {
	pub fn from_raw(raw: &Value) -> Self {
		Self {
			id: at(raw, &["id"]).cloned().unwrap_or(Value::Null),
			title: text(raw, &["title"]),
			description: text(raw, &["description"]),
			excerpt: text(raw, &["excerpt"]),
			url: text(raw, &["url"]),
			start_date: text(raw, &["start_date"]),
			end_date: text(raw, &["end_date"]),
			all_day: flag_or_raw(raw, &["all_day"]),
			venue: object(raw, &["venue"]).map(Venue::from_raw),
			organizer: first_organizer(raw).map(Organizer::from_raw),
			categories: list(raw, &["categories"])
				.map(|cats| cats.iter().map(EventCategory::from_raw).collect()),
			last_updated_source: first_text(raw, &["modified", "date"]).map(str::to_string),
		}
	}
}

// Tribe returns `organizer` as a list of organizers; older payloads and
// hand-built fixtures use a single object.
fn first_organizer(raw: &Value) -> Option<&Value> {
	object(raw, &["organizer"]).or_else(|| object(raw, &["organizer", "0"]))
}

impl Venue {
	fn from_raw(raw: &Value) -> Self {
		Self {
			id: integer_or_raw(raw, &["id"]),
			name: text(raw, &["venue"]),
			address: text(raw, &["address"]),
			city: text(raw, &["city"]),
			country: text(raw, &["country"]),
			zip: text(raw, &["zip"]),
			state: text(raw, &["state"]),
			website: text(raw, &["website"]),
			latitude: float(raw, &["geo_lat"]),
			longitude: float(raw, &["geo_lng"]),
		}
	}
}

impl Organizer {
	fn from_raw(raw: &Value) -> Self {
		Self {
			id: integer_or_raw(raw, &["id"]),
			name: text(raw, &["organizer"]),
			phone: text(raw, &["phone"]),
			website: text(raw, &["website"]),
			email: text(raw, &["email"]),
		}
	}
}

impl EventCategory {
	fn from_raw(raw: &Value) -> Self {
		Self {
			id: integer_or_raw(raw, &["id"]),
			name: text(raw, &["name"]),
			slug: text(raw, &["slug"]),
		}
	}
}

#[cfg(test)]
#[cfg(feature = "unit-tests")]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn venue_fields_are_individually_nullable() {
		let raw = json!({
			"id": 901,
			"title": "Sommerfest",
			"all_day": true,
			"venue": {"id": 12, "venue": "Zunfthaus", "city": "Zürich", "geo_lat": "47.37"}
		});

		let event = EventRecord::from_raw(&raw);
		let venue = event.venue.expect("venue present");
		assert_eq!(venue.id, json!(12));
		assert_eq!(venue.name.as_deref(), Some("Zunfthaus"));
		assert_eq!(venue.city.as_deref(), Some("Zürich"));
		assert_eq!(venue.state, None);
		assert_eq!(venue.latitude, Some(47.37));
		assert_eq!(venue.longitude, None);
		assert_eq!(event.all_day, json!(true));
	}

	#[test]
	fn empty_list_venue_is_null() {
		let event = EventRecord::from_raw(&json!({"id": 1, "venue": []}));
		assert_eq!(event.venue, None);
	}

	#[test]
	fn organizer_list_takes_first_entry() {
		let raw = json!({"id": 1, "organizer": [{"id": 5, "organizer": "Verein", "email": "a@b.ch"}]});
		let organizer = EventRecord::from_raw(&raw).organizer.expect("organizer");
		assert_eq!(organizer.id, json!(5));
		assert_eq!(organizer.name.as_deref(), Some("Verein"));
		assert_eq!(organizer.phone, None);
	}

	#[test]
	fn categories_are_projected_per_entry() {
		let raw = json!({"id": 1, "categories": [{"id": 3, "name": "Musik", "slug": "musik", "count": 9}, 4]});
		let cats = EventRecord::from_raw(&raw).categories.expect("categories");
		assert_eq!(cats.len(), 2);
		assert_eq!(cats[0], EventCategory { id: json!(3), name: Some("Musik".into()), slug: Some("musik".into()) });
		assert_eq!(cats[1], EventCategory { id: Value::Null, name: None, slug: None });
	}

	#[test]
	fn serialized_venue_uses_source_key_names() {
		let event = EventRecord::from_raw(&json!({"id": 1, "venue": {"venue": "Halle"}}));
		let value = serde_json::to_value(&event).unwrap();
		assert_eq!(value["venue"]["venue"], "Halle");
		assert!(value["venue"].get("name").is_none());
		assert!(value["venue"]["zip"].is_null());
	}
}
