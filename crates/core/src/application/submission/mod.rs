// Submission Service - Core use case for job intake

pub mod submit;


pub use submit::{DeliveryStatus, SubmissionConfig, SubmissionStage, SubmitOutcome, SubmitRequest};

use crate::error::Result;
use crate::port::{EventEmitter, IdProvider, JobStore, TimeProvider};
use std::sync::Arc;

/// Submission Service
///
/// Holds the injected ports; each call to [`SubmissionService::submit`] is an
/// independent identify / persist / emit chain.
pub struct SubmissionService {
    store: Arc<dyn JobStore>,
    emitter: Arc<dyn EventEmitter>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    config: SubmissionConfig,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn JobStore>,
        emitter: Arc<dyn EventEmitter>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self::with_config(
            store,
            emitter,
            id_provider,
            time_provider,
            SubmissionConfig::default(),
        )
    }

    pub fn with_config(
        store: Arc<dyn JobStore>,
        emitter: Arc<dyn EventEmitter>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            store,
            emitter,
            id_provider,
            time_provider,
            config,
        }
    }

    /// Create, persist and announce a new job
    pub async fn submit(&self, req: SubmitRequest) -> Result<SubmitOutcome> {
        submit::execute(
            self.store.as_ref(),
            self.emitter.clone(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            &self.config,
            req,
        )
        .await
    }

    /// Read access to the store behind this service
    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }
}
