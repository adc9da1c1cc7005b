use crate::normalize::NormalizedRecord;
use crate::store::StoredRecord;

/// Whether writing `candidate` can be skipped.
///
/// Only true when a stored record exists and both its change marker and the
/// candidate's are present and equal. A missing marker on either side always
/// forces a write.
pub fn should_skip(existing: Option<&StoredRecord>, candidate: &NormalizedRecord) -> bool {
	let stored = existing.and_then(StoredRecord::source_marker);
	let incoming = candidate.last_updated_source().filter(|s| !s.is_empty());
	matches!((stored, incoming), (Some(a), Some(b)) if a == b)
}
