// Job Store Port (Interface)

use crate::domain::{JobRecord, JobState};
use crate::error::Result;
use async_trait::async_trait;

/// Durable key/value store for job records
///
/// Keys follow `job:<jobId>`. A record becomes visible to readers only
/// once it is fully written.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Atomically insert or replace the record under `key`
    async fn set(&self, key: &str, record: &JobRecord) -> Result<()>;

    /// Fetch the record under `key` (`None` if absent)
    async fn get(&self, key: &str) -> Result<Option<JobRecord>>;

    /// Check whether `key` holds a record
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// List job records in the given state, oldest first
    async fn find_by_state(&self, state: JobState) -> Result<Vec<JobRecord>>;

    /// List job records in `state` created at or after `since_millis`
    ///
    /// Records with an unreadable `createdAt` are left out. Stores that can
    /// filter on their side should override this.
    async fn find_by_state_since(
        &self,
        state: JobState,
        since_millis: i64,
    ) -> Result<Vec<JobRecord>> {
        Ok(self
            .find_by_state(state)
            .await?
            .into_iter()
            .filter(|record| record.created_at_millis().is_some_and(|at| at >= since_millis))
            .collect())
    }
}
