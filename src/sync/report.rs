use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::normalize::RecordKind;
use crate::upsert::UpsertOutcome;

/// Outcome counts for one kind in one run.
///
/// `missing_id` counts items dropped before normalization; they are not
/// part of `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindTally {
	pub kind: RecordKind,
	pub namespace: String,
	pub items_fetched: usize,
	pub created: usize,
	pub updated: usize,
	pub skipped: usize,
	pub failed: usize,
	pub missing_id: usize,
}

impl KindTally {
	pub fn new(kind: RecordKind, namespace: impl Into<String>) -> Self {
		Self {
			kind,
			namespace: namespace.into(),
			items_fetched: 0,
			created: 0,
			updated: 0,
			skipped: 0,
			failed: 0,
			missing_id: 0,
		}
	}

	pub fn record(&mut self, outcome: UpsertOutcome) {
		match outcome {
			UpsertOutcome::Created => self.created += 1,
			UpsertOutcome::Updated => self.updated += 1,
			UpsertOutcome::Skipped => self.skipped += 1,
		}
	}

	/// A deferred commit failed: nothing reported as written took effect.
	pub fn fail_staged(&mut self) {
		self.failed += self.created + self.updated;
		self.created = 0;
		self.updated = 0;
	}

	pub fn written(&self) -> usize {
		self.created + self.updated
	}
}

/// Both kinds of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
	pub started_at: DateTime<Utc>,
	pub finished_at: DateTime<Utc>,
	pub posts: KindTally,
	pub events: KindTally,
}

/// Counts summed over every kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
	pub items_fetched: usize,
	pub created: usize,
	pub updated: usize,
	pub skipped: usize,
	pub failed: usize,
	pub missing_id: usize,
}

impl SyncReport {
	pub fn totals(&self) -> Totals {
		[&self.posts, &self.events]
			.into_iter()
			.fold(Totals::default(), |acc, t| Totals {
				items_fetched: acc.items_fetched + t.items_fetched,
				created: acc.created + t.created,
				updated: acc.updated + t.updated,
				skipped: acc.skipped + t.skipped,
				failed: acc.failed + t.failed,
				missing_id: acc.missing_id + t.missing_id,
			})
	}
}
