//! Startup reconciliation against the SQLite store

use std::sync::Arc;
use std::time::Duration;

use ytflow_core::application::{ReconcileReport, ReconcileService};
use ytflow_core::domain::{JobRecord, YT_SUBMIT_TOPIC};
use ytflow_core::port::time_provider::FixedTimeProvider;
use ytflow_core::port::{EventSubscriber, JobStore};
use ytflow_infra_bus::InMemoryEventBus;
use ytflow_infra_sqlite::{create_pool, run_migrations, SqliteJobStore};

const NOW: i64 = 1_700_000_000_000;
const HOUR: i64 = 3_600_000;

async fn seeded_store(records: &[JobRecord]) -> Arc<SqliteJobStore> {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let store = Arc::new(SqliteJobStore::new(pool, Arc::new(FixedTimeProvider(NOW))));
    for record in records {
        store.set(&record.key(), record).await.unwrap();
    }
    store
}

#[tokio::test]
async fn test_recent_created_jobs_are_reannounced() {
    let store = seeded_store(&[
        JobRecord::created("job_stale", NOW - 3 * HOUR, "old", "old@b.com"),
        JobRecord::created("job_recent", NOW - 10_000, "tech-news", "a@b.com"),
    ])
    .await;
    let bus = Arc::new(InMemoryEventBus::default());
    let mut events = bus.subscribe(YT_SUBMIT_TOPIC).await.unwrap();

    let report = ReconcileService::new(store, bus, Arc::new(FixedTimeProvider(NOW)), Some(HOUR))
        .redeliver_pending()
        .await
        .unwrap();

    assert_eq!(
        report,
        ReconcileReport {
            scanned: 1,
            redelivered: 1,
            undelivered: 0,
            failed: 0,
        }
    );

    let event = events.recv().await.unwrap();
    assert_eq!(event.payload["jobId"], "job_recent");
    assert_eq!(event.payload["channel"], "tech-news");

    let more = tokio::time::timeout(Duration::from_millis(50), events.recv()).await;
    assert!(more.is_err(), "stale job must not be re-announced");
}

#[tokio::test]
async fn test_closed_bus_counts_failures() {
    let store = seeded_store(&[JobRecord::created("job_1", NOW, "c", "a@b.com")]).await;
    let bus = Arc::new(InMemoryEventBus::default());
    bus.close();

    let report = ReconcileService::new(store.clone(), bus, Arc::new(FixedTimeProvider(NOW)), None)
        .redeliver_pending()
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.redelivered, 0);
    // Records are untouched
    assert!(store.exists("job:job_1").await.unwrap());
}

#[tokio::test]
async fn test_empty_store_is_a_noop() {
    let store = seeded_store(&[]).await;

    let report = ReconcileService::new(
        store,
        Arc::new(InMemoryEventBus::default()),
        Arc::new(FixedTimeProvider(NOW)),
        None,
    )
    .redeliver_pending()
    .await
    .unwrap();

    assert_eq!(report, ReconcileReport::default());
}

#[tokio::test]
async fn test_no_subscribers_is_reported_as_undelivered() {
    let store = seeded_store(&[JobRecord::created("job_1", NOW, "c", "a@b.com")]).await;

    let report = ReconcileService::new(
        store,
        Arc::new(InMemoryEventBus::default()),
        Arc::new(FixedTimeProvider(NOW)),
        None,
    )
    .redeliver_pending()
    .await
    .unwrap();

    assert_eq!(report.scanned, 1);
    assert_eq!(report.redelivered, 0);
    assert_eq!(report.undelivered, 1);
}

#[tokio::test]
async fn test_reconcile_after_first_subscriber_reaches_it() {
    let store = seeded_store(&[JobRecord::created("job_1", NOW, "c", "a@b.com")]).await;
    let bus = Arc::new(InMemoryEventBus::default());

    let reconcile = {
        let bus = bus.clone();
        tokio::spawn(async move {
            bus.wait_for_subscriber(YT_SUBMIT_TOPIC).await;
            ReconcileService::new(store, bus, Arc::new(FixedTimeProvider(NOW)), None)
                .redeliver_pending()
                .await
                .unwrap()
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    let mut events = bus.subscribe(YT_SUBMIT_TOPIC).await.unwrap();

    let report = tokio::time::timeout(Duration::from_secs(1), reconcile)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.redelivered, 1);
    assert_eq!(events.recv().await.unwrap().payload["jobId"], "job_1");
}
