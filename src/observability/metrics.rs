use prometheus::{
	Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "uccelli";

/// Central registry for all Prometheus metrics
pub struct MetricsRegistry {
	registry: Registry,

	// Run-level metrics
	pub sync_runs_total: IntCounter,
	pub sync_duration_seconds: Histogram,

	// Per-kind pipeline metrics, labelled by `kind`
	pub items_fetched_total: IntCounterVec,
	pub source_fetch_failures_total: IntCounterVec,
	/// Labelled by `kind` and `outcome`.
	pub outcomes_total: IntCounterVec,

	// Batched store metrics
	pub batch_commits_total: IntCounter,
	pub batch_failures_total: IntCounter,

	// Translation trigger metrics
	pub translation_triggers_total: IntCounter,
	pub translation_trigger_failures_total: IntCounter,
}

impl MetricsRegistry {
	pub fn new() -> Result<Self, prometheus::Error> {
		let registry = Registry::new();

		let sync_runs_total = IntCounter::with_opts(
			Opts::new("sync_runs_total", "Total number of sync runs started").namespace(NAMESPACE),
		)?;

		let sync_duration_seconds = Histogram::with_opts(
			HistogramOpts::new("sync_duration_seconds", "Duration of full sync runs in seconds")
				.namespace(NAMESPACE)
				.buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0]),
		)?;

		let items_fetched_total = IntCounterVec::new(
			Opts::new("items_fetched_total", "Raw items fetched from the source").namespace(NAMESPACE),
			&["kind"],
		)?;

		let source_fetch_failures_total = IntCounterVec::new(
			Opts::new(
				"source_fetch_failures_total",
				"Source fetches that degraded to an empty result",
			)
			.namespace(NAMESPACE),
			&["kind"],
		)?;

		let outcomes_total = IntCounterVec::new(
			Opts::new("outcomes_total", "Per-record sync outcomes").namespace(NAMESPACE),
			&["kind", "outcome"],
		)?;

		let batch_commits_total = IntCounter::with_opts(
			Opts::new("batch_commits_total", "Batches committed to the document store")
				.namespace(NAMESPACE),
		)?;

		let batch_failures_total = IntCounter::with_opts(
			Opts::new("batch_failures_total", "Batch commits rejected by the document store")
				.namespace(NAMESPACE),
		)?;

		let translation_triggers_total = IntCounter::with_opts(
			Opts::new("translation_triggers_total", "Translation trigger calls attempted")
				.namespace(NAMESPACE),
		)?;

		let translation_trigger_failures_total = IntCounter::with_opts(
			Opts::new(
				"translation_trigger_failures_total",
				"Translation trigger calls that failed",
			)
			.namespace(NAMESPACE),
		)?;

		registry.register(Box::new(sync_runs_total.clone()))?;
		registry.register(Box::new(sync_duration_seconds.clone()))?;
		registry.register(Box::new(items_fetched_total.clone()))?;
		registry.register(Box::new(source_fetch_failures_total.clone()))?;
		registry.register(Box::new(outcomes_total.clone()))?;
		registry.register(Box::new(batch_commits_total.clone()))?;
		registry.register(Box::new(batch_failures_total.clone()))?;
		registry.register(Box::new(translation_triggers_total.clone()))?;
		registry.register(Box::new(translation_trigger_failures_total.clone()))?;

		Ok(Self {
			registry,
			sync_runs_total,
			sync_duration_seconds,
			items_fetched_total,
			source_fetch_failures_total,
			outcomes_total,
			batch_commits_total,
			batch_failures_total,
			translation_triggers_total,
			translation_trigger_failures_total,
		})
	}

	/// Add `count` to the outcome counter for one kind.
	pub fn record_outcome(&self, kind: &str, outcome: &str, count: u64) {
		if count > 0 {
			self.outcomes_total
				.with_label_values(&[kind, outcome])
				.inc_by(count);
		}
	}

	/// Encode metrics in Prometheus text format
	pub fn encode(&self) -> String {
		let encoder = TextEncoder::new();
		let metric_families = self.registry.gather();
		match encoder.encode_to_string(&metric_families) {
			Ok(s) => s,
			Err(e) => {
				log::error!("Failed to encode metrics: {}", e);
				String::new()
			}
		}
	}
}

#[cfg(test)]
#[cfg(feature = "unit-tests")]
mod tests {
	#[test]
	fn metrics_registry_creation() {
		let registry = super::MetricsRegistry::new().unwrap();
		assert!(!registry.encode().is_empty());
	}

	#[test]
	fn outcome_counters_are_labelled() {
		let registry = super::MetricsRegistry::new().unwrap();
		registry.record_outcome("post", "created", 3);
		registry.record_outcome("event", "skipped", 0);
		let text = registry.encode();
		assert!(text.contains("uccelli_outcomes_total{kind=\"post\",outcome=\"created\"} 3"));
		assert!(!text.contains("outcome=\"skipped\""));
	}
}
