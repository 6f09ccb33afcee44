// Submit Use Case

use crate::domain::{JobId, JobRecord, SubmitEvent};
use crate::error::{AppError, Result};
use crate::port::{EventEmitter, IdProvider, JobStore, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Submit request (already validated by the HTTP boundary)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub channel: String,
    pub email: String,
}

/// Per-step limits for the two I/O calls
///
/// An elapsed limit counts as a failure of that step.
#[derive(Debug, Clone, Default)]
pub struct SubmissionConfig {
    pub store_timeout: Option<Duration>,
    pub emit_timeout: Option<Duration>,
}

/// Lifecycle of one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Received,
    Identified,
    Persisted,
    Emitted,
    Acknowledged,
    Failed,
}

impl std::fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SubmissionStage::Received => "received",
            SubmissionStage::Identified => "identified",
            SubmissionStage::Persisted => "persisted",
            SubmissionStage::Emitted => "emitted",
            SubmissionStage::Acknowledged => "acknowledged",
            SubmissionStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What happened to the `YT.submit` notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Accepted by the bus and handed to this many subscribers
    Delivered { subscribers: usize },
    /// Emission failed; the job is still durably created
    Failed { reason: String },
}

/// Result of an acknowledged submission
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub job_id: JobId,
    pub delivery: DeliveryStatus,
}

/// Execute submit use case
///
/// Persistence always completes before emission starts. Emission runs on a
/// detached task: once the record is stored, the event is still published
/// even if the caller stops waiting.
///
/// # Arguments
///
/// * `store` - Job store
/// * `emitter` - Event bus (shared with the detached emission task)
/// * `id_provider` - ID generator (injected for determinism)
/// * `time_provider` - Time provider (injected for determinism)
/// * `config` - Step timeouts
/// * `req` - Validated submit request
pub async fn execute(
    store: &dyn JobStore,
    emitter: Arc<dyn EventEmitter>,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    config: &SubmissionConfig,
    req: SubmitRequest,
) -> Result<SubmitOutcome> {
    debug!(stage = %SubmissionStage::Received, channel = %req.channel, "Submission received");

    // Received -> Identified
    let job_id = id_provider.generate_id().map_err(|e| {
        error!(stage = %SubmissionStage::Failed, error = %e, "Job ID generation failed");
        match e {
            AppError::Identity(_) => e,
            other => AppError::Identity(other.to_string()),
        }
    })?;

    // Identified -> Persisted
    let record = JobRecord::created(
        job_id.clone(),
        time_provider.now_millis(),
        req.channel,
        req.email,
    );
    let key = record.key();

    if let Err(e) = persist(store, &key, &record, config.store_timeout).await {
        error!(
            stage = %SubmissionStage::Failed,
            job_id = %job_id,
            error = %e,
            "Job persistence failed, nothing emitted"
        );
        return Err(e);
    }

    info!(
        stage = %SubmissionStage::Persisted,
        job_id = %record.job_id,
        channel = %record.channel,
        email = %record.email,
        state = %record.state,
        created_at = %record.created_at,
        "Job Created"
    );

    // Persisted -> Emitted
    let event = record.to_submit_event();
    let emit_timeout = config.emit_timeout;
    let emission = tokio::spawn(async move { deliver(emitter.as_ref(), event, emit_timeout).await });

    let delivery = match emission.await {
        Ok(Ok(subscribers)) => {
            debug!(stage = %SubmissionStage::Emitted, job_id = %job_id, subscribers, "Submit event emitted");
            DeliveryStatus::Delivered { subscribers }
        }
        Ok(Err(e)) => {
            warn!(
                job_id = %job_id,
                error = %e,
                "Submit event delivery failed; job remains Created for reconciliation"
            );
            DeliveryStatus::Failed {
                reason: e.to_string(),
            }
        }
        Err(join_err) => {
            error!(job_id = %job_id, error = %join_err, "Emission task aborted");
            DeliveryStatus::Failed {
                reason: join_err.to_string(),
            }
        }
    };

    // Emitted -> Acknowledged
    debug!(stage = %SubmissionStage::Acknowledged, job_id = %job_id, "Submission acknowledged");
    Ok(SubmitOutcome { job_id, delivery })
}

/// Store the record, folding every failure into `Persistence`
async fn persist(
    store: &dyn JobStore,
    key: &str,
    record: &JobRecord,
    limit: Option<Duration>,
) -> Result<()> {
    let result = match limit {
        Some(limit) => match tokio::time::timeout(limit, store.set(key, record)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Persistence(format!(
                "store write for {} timed out after {:?}",
                key, limit
            ))),
        },
        None => store.set(key, record).await,
    };

    result.map_err(|e| match e {
        AppError::Persistence(_) => e,
        other => AppError::Persistence(other.to_string()),
    })
}

/// Publish a `YT.submit` event, folding every failure into `Delivery`
pub(crate) async fn deliver(
    emitter: &dyn EventEmitter,
    event: SubmitEvent,
    limit: Option<Duration>,
) -> Result<usize> {
    let event = event
        .into_event()
        .map_err(|e| AppError::Delivery(e.to_string()))?;

    let result = match limit {
        Some(limit) => match tokio::time::timeout(limit, emitter.emit(event)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Delivery(format!(
                "emit timed out after {:?}",
                limit
            ))),
        },
        None => emitter.emit(event).await,
    };

    result.map_err(|e| match e {
        AppError::Delivery(_) => e,
        other => AppError::Delivery(other.to_string()),
    })
}
