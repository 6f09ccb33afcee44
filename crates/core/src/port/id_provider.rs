// ID Provider Port (for deterministic testing)

use crate::domain::JOB_ID_PREFIX;
use crate::error::Result;
use crate::port::TimeProvider;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// ID provider interface (allows deterministic IDs in tests)
///
/// Implementations must never hand out the same ID twice, including under
/// concurrent calls.
pub trait IdProvider: Send + Sync {
    /// Generate a new unique job ID
    fn generate_id(&self) -> Result<String>;
}

/// Timestamp + process nonce + sequence provider (production default)
///
/// Produces `job_<epochMillis>_<nonce><seq>`. The timestamp alone collides
/// within a clock tick; the atomic sequence separates calls inside one
/// process and the random nonce separates processes sharing a store.
pub struct TimestampIdProvider {
    time_provider: Arc<dyn TimeProvider>,
    nonce: u32,
    seq: AtomicU64,
}

impl TimestampIdProvider {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self::with_nonce(time_provider, rand::random())
    }

    pub fn with_nonce(time_provider: Arc<dyn TimeProvider>, nonce: u32) -> Self {
        Self {
            time_provider,
            nonce,
            seq: AtomicU64::new(0),
        }
    }
}

impl IdProvider for TimestampIdProvider {
    fn generate_id(&self) -> Result<String> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let millis = self.time_provider.now_millis();
        Ok(format!(
            "{}{}_{:08x}{:x}",
            JOB_ID_PREFIX, millis, self.nonce, seq
        ))
    }
}

/// UUID v4 provider
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> Result<String> {
        Ok(format!("{}{}", JOB_ID_PREFIX, uuid::Uuid::new_v4().simple()))
    }
}
