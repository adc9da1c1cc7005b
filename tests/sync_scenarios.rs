//! End-to-end sync runs against both write strategies.

mod common;

use std::sync::Arc;

use common::{Backend, RejectingDocumentStore, RejectingTableStore, StaticSource, namespaces};
use serde_json::{Value, json};
use uccelli_sync::normalize::{RecordId, RecordKind};
use uccelli_sync::observability::MetricsRegistry;
use uccelli_sync::sync::SyncOrchestrator;
use uccelli_sync::store::TableStore;
use uccelli_sync::upsert::{BatchedUpsert, PerItemUpsert};

fn post(id: i64, modified: &str, title: &str) -> Value {
	json!({
		"id": id,
		"date": "2024-03-01T10:00:00",
		"modified": modified,
		"slug": format!("post-{}", id),
		"status": "publish",
		"type": "post",
		"title": {"rendered": title},
		"content": {"rendered": "<p>body</p>"},
		"excerpt": {"rendered": "<p>short</p>"},
		"author": 2,
		"featured_media": 0,
		"categories": [3, 4],
		"tags": [],
	})
}

fn event(id: i64, modified: &str) -> Value {
	json!({
		"id": id,
		"title": "Konzert",
		"description": "<p>Abend</p>",
		"start_date": "2024-05-01 19:00:00",
		"end_date": "2024-05-01 21:00:00",
		"all_day": false,
		"modified": modified,
		"venue": {"venue": "Aula", "address": "Hauptstrasse 1", "city": "Bern", "country": "CH", "geo_lat": "46.94", "geo_lng": "7.44"},
		"organizer": [{"organizer": "Uccelli"}],
		"categories": [{"name": "Musik", "slug": "musik"}],
	})
}

#[cfg(feature = "unit-tests")]
#[tokio::test]
async fn first_run_creates_second_run_skips() {
	for backend in Backend::all() {
		let source = Arc::new(StaticSource::new(
			vec![post(1, "2024-03-02T08:00:00", "Eins"), post(2, "2024-03-02T09:00:00", "Zwei")],
			vec![event(10, "2024-04-01 12:00:00")],
		));
		let sync = backend.orchestrator(source);

		let first = sync.sync_all().await;
		assert_eq!(first.posts.created, 2, "{}", backend.name());
		assert_eq!(first.events.created, 1, "{}", backend.name());

		let second = sync.sync_all().await;
		let totals = second.totals();
		assert_eq!(totals.skipped, 3, "{}", backend.name());
		assert_eq!(totals.created + totals.updated + totals.failed, 0, "{}", backend.name());
	}
}

#[cfg(feature = "unit-tests")]
#[tokio::test]
async fn created_records_start_without_translations() {
	for backend in Backend::all() {
		let source = Arc::new(StaticSource::new(vec![post(7, "m1", "Sieben")], vec![]));
		backend.orchestrator(source).sync_all().await;

		let stored = backend.stored("wordpress_posts", "7").await.expect("stored post");
		assert_eq!(stored.translations, json!({}), "{}", backend.name());
		assert_eq!(stored.last_translated, None, "{}", backend.name());
		assert_eq!(stored.last_updated_source.as_deref(), Some("m1"));
		assert_eq!(stored.original_data["title"], "Sieben");
		assert_eq!(stored.original_data["excerpt"], "<p>short</p>");
	}
}

#[cfg(feature = "unit-tests")]
#[tokio::test]
async fn source_change_updates_and_keeps_translations() {
	for backend in Backend::all() {
		let source = Arc::new(StaticSource::new(vec![post(5, "m1", "Alt")], vec![]));
		let sync = backend.orchestrator(source.clone());
		sync.sync_all().await;

		let translated = json!({"en": {"title": "Old"}, "fr": {"title": "Vieux"}});
		backend
			.translate("wordpress_posts", "5", translated.clone(), json!("2024-03-03T00:00:00Z"))
			.await;

		source.set_posts(vec![post(5, "m2", "Neu")]).await;
		let report = sync.sync_all().await;
		assert_eq!(report.posts.updated, 1, "{}", backend.name());

		let stored = backend.stored("wordpress_posts", "5").await.expect("stored post");
		assert_eq!(stored.original_data["title"], "Neu", "{}", backend.name());
		assert_eq!(stored.translations, translated, "{}", backend.name());
		assert_eq!(stored.last_translated, Some(json!("2024-03-03T00:00:00Z")));
		assert_eq!(stored.last_updated_source.as_deref(), Some("m2"));
	}
}

#[cfg(feature = "unit-tests")]
#[tokio::test]
async fn records_without_marker_are_rewritten_every_run() {
	for backend in Backend::all() {
		let mut unmarked = post(3, "", "Drei");
		let fields = unmarked.as_object_mut().unwrap();
		fields.remove("modified");
		fields.remove("date");
		let source = Arc::new(StaticSource::new(vec![unmarked], vec![]));
		let sync = backend.orchestrator(source);

		assert_eq!(sync.sync_all().await.posts.created, 1, "{}", backend.name());
		assert_eq!(sync.sync_all().await.posts.updated, 1, "{}", backend.name());
	}
}

#[cfg(feature = "unit-tests")]
#[tokio::test]
async fn items_without_id_are_dropped_and_counted() {
	for backend in Backend::all() {
		let source = Arc::new(StaticSource::new(
			vec![post(1, "m1", "Eins"), json!({"title": {"rendered": "no id"}})],
			vec![json!({"id": null, "title": "no id"})],
		));
		let report = backend.orchestrator(source).sync_all().await;
		assert_eq!(report.posts.items_fetched, 2);
		assert_eq!(report.posts.created, 1, "{}", backend.name());
		assert_eq!(report.posts.missing_id, 1, "{}", backend.name());
		assert_eq!(report.events.missing_id, 1, "{}", backend.name());
		assert_eq!(report.totals().failed, 0, "{}", backend.name());
	}
}

#[cfg(feature = "unit-tests")]
#[tokio::test]
async fn events_are_stored_in_normalized_shape() {
	for backend in Backend::all() {
		let source = Arc::new(StaticSource::new(vec![], vec![event(10, "e1")]));
		backend.orchestrator(source).sync_all().await;

		let stored = backend.stored("tribe_events", "10").await.expect("stored event");
		let data = &stored.original_data;
		assert_eq!(data["venue"]["venue"], "Aula", "{}", backend.name());
		assert_eq!(data["venue"]["latitude"], 46.94);
		assert_eq!(data["organizer"]["organizer"], "Uccelli");
		assert_eq!(data["categories"][0]["slug"], "musik");
		assert_eq!(data["last_updated_source"], "e1");
	}
}

#[cfg(feature = "unit-tests")]
#[tokio::test]
async fn unchanged_batch_commits_nothing() {
	let store = Arc::new(uccelli_sync::store::MemoryDocumentStore::new());
	let backend = Backend::Documents(store.clone());
	let source = Arc::new(StaticSource::new(vec![post(1, "m1", "Eins")], vec![event(2, "e1")]));
	let sync = backend.orchestrator(source);

	sync.sync_all().await;
	assert_eq!(store.commit_count(), 2);
	sync.sync_all().await;
	assert_eq!(store.commit_count(), 2);
}

#[cfg(feature = "unit-tests")]
#[tokio::test]
async fn rejected_batch_counts_every_staged_write_as_failed() {
	let metrics = Arc::new(MetricsRegistry::new().unwrap());
	let source = Arc::new(StaticSource::new(
		vec![post(1, "m1", "Eins"), post(2, "m1", "Zwei")],
		vec![],
	));
	let sync = SyncOrchestrator::new(
		source,
		Arc::new(BatchedUpsert::new(Arc::new(RejectingDocumentStore::default()))),
		namespaces(),
		metrics.clone(),
	);

	let tally = sync.sync_kind(RecordKind::Post).await;
	assert_eq!(tally.created, 0);
	assert_eq!(tally.failed, 2);
	assert_eq!(metrics.batch_failures_total.get(), 1);
	assert_eq!(metrics.batch_commits_total.get(), 0);
}

#[cfg(feature = "unit-tests")]
#[tokio::test]
async fn rejected_row_does_not_stop_later_rows() {
	let store = Arc::new(RejectingTableStore::new("2"));
	let source = Arc::new(StaticSource::new(
		vec![post(1, "m1", "Eins"), post(2, "m1", "Zwei"), post(3, "m1", "Drei")],
		vec![],
	));
	let sync = SyncOrchestrator::new(
		source,
		Arc::new(PerItemUpsert::new(store.clone())),
		namespaces(),
		Arc::new(MetricsRegistry::new().unwrap()),
	);

	let tally = sync.sync_kind(RecordKind::Post).await;
	assert_eq!((tally.created, tally.failed, tally.skipped), (2, 1, 0));

	let rows = &store.inner;
	for (id, present) in [("1", true), ("2", false), ("3", true)] {
		let row = rows.fetch_row("wordpress_posts", &RecordId::from(id)).await.unwrap();
		assert_eq!(row.is_some(), present, "row {}", id);
	}
}
