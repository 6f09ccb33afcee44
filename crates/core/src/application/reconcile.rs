// Startup reconciliation: re-announce jobs whose event may have been lost
use crate::application::constants::DEFAULT_RECONCILE_WINDOW_MS;
use crate::application::submission::submit::deliver;
use crate::domain::JobState;
use crate::port::{EventEmitter, JobStore, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Counters from one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub scanned: usize,
    /// Queued for at least one subscriber
    pub redelivered: usize,
    /// Accepted by the bus, but nobody was subscribed
    pub undelivered: usize,
    pub failed: usize,
}

/// Reconciliation service
///
/// A swallowed delivery failure, or a crash between persist and emit, leaves
/// a `Created` job nobody was told about. On daemon startup every `Created`
/// job inside the window gets its `YT.submit` event published again.
/// Consumers already see duplicates under at-least-once delivery.
pub struct ReconcileService {
    store: Arc<dyn JobStore>,
    emitter: Arc<dyn EventEmitter>,
    time_provider: Arc<dyn TimeProvider>,
    window_ms: i64,
    emit_timeout: Option<Duration>,
}

impl ReconcileService {
    /// Create a new reconcile service
    ///
    /// # Arguments
    /// * `store` - Job store
    /// * `emitter` - Event bus
    /// * `time_provider` - Time provider
    /// * `window_ms` - Optional custom window (default: 1 hour)
    ///
    /// # Example
    /// ```ignore
    /// let reconcile = ReconcileService::new(store, bus, time_provider, None);
    /// reconcile.redeliver_pending().await?;
    /// ```
    pub fn new(
        store: Arc<dyn JobStore>,
        emitter: Arc<dyn EventEmitter>,
        time_provider: Arc<dyn TimeProvider>,
        window_ms: Option<i64>,
    ) -> Self {
        Self {
            store,
            emitter,
            time_provider,
            window_ms: window_ms.unwrap_or(DEFAULT_RECONCILE_WINDOW_MS),
            emit_timeout: None,
        }
    }

    pub fn with_emit_timeout(mut self, emit_timeout: Option<Duration>) -> Self {
        self.emit_timeout = emit_timeout;
        self
    }

    /// Re-emit `YT.submit` for every recent `Created` job
    ///
    /// Per-job delivery failures are counted, not returned.
    pub async fn redeliver_pending(&self) -> crate::error::Result<ReconcileReport> {
        let now = self.time_provider.now_millis();
        let cutoff = now - self.window_ms;

        info!(
            cutoff = %cutoff,
            window_ms = %self.window_ms,
            "Starting submission reconciliation"
        );

        let pending = self
            .store
            .find_by_state_since(JobState::Created, cutoff)
            .await?;
        let mut report = ReconcileReport {
            scanned: pending.len(),
            ..Default::default()
        };

        for record in pending {
            match deliver(
                self.emitter.as_ref(),
                record.to_submit_event(),
                self.emit_timeout,
            )
            .await
            {
                Ok(0) => {
                    warn!(job_id = %record.job_id, "No subscribers, submit event not redelivered");
                    report.undelivered += 1;
                }
                Ok(subscribers) => {
                    info!(job_id = %record.job_id, subscribers, "Submit event redelivered");
                    report.redelivered += 1;
                }
                Err(e) => {
                    warn!(job_id = %record.job_id, error = %e, "Redelivery failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            redelivered = report.redelivered,
            undelivered = report.undelivered,
            failed = report.failed,
            "Submission reconciliation complete"
        );
        Ok(report)
    }
}
