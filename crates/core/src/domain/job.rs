// Job Domain Model

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Job ID (opaque, prefixed with `job_`)
pub type JobId = String;

/// Prefix carried by every generated job ID
pub const JOB_ID_PREFIX: &str = "job_";

/// Prefix of every job key in the store
pub const JOB_KEY_PREFIX: &str = "job:";

/// Store key for a job: `job:<jobId>`
pub fn job_key(job_id: &str) -> String {
    format!("{}{}", JOB_KEY_PREFIX, job_id)
}

/// Job State
///
/// Only `Created` is ever written by the submission pipeline. Downstream
/// stages own every later transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Created,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Created => "Created",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobState {
    type Err = crate::domain::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(JobState::Created),
            other => Err(crate::domain::DomainError::UnknownState(other.to_string())),
        }
    }
}

/// Job Record - the persisted unit of work
///
/// Field names are part of the stored schema and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: JobId,
    pub channel: String,
    pub email: String,
    pub state: JobState,
    pub created_at: String, // ISO-8601 UTC, millisecond precision
}

impl JobRecord {
    /// Build a fresh record in the `Created` state
    ///
    /// # Arguments
    ///
    /// * `job_id` - Unique job ID (injected, not generated)
    /// * `created_at_millis` - Creation time in epoch ms (injected, not system time)
    /// * `channel` - Target channel
    /// * `email` - Contact address
    pub fn created(
        job_id: impl Into<String>,
        created_at_millis: i64,
        channel: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            channel: channel.into(),
            email: email.into(),
            state: JobState::Created,
            created_at: format_timestamp(created_at_millis),
        }
    }

    /// Store key for this record
    pub fn key(&self) -> String {
        job_key(&self.job_id)
    }

    /// Creation time in epoch ms, if `created_at` parses
    pub fn created_at_millis(&self) -> Option<i64> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.timestamp_millis())
    }

    /// Event payload projection (identity fields only)
    pub fn to_submit_event(&self) -> crate::domain::SubmitEvent {
        crate::domain::SubmitEvent {
            job_id: self.job_id.clone(),
            channel: self.channel.clone(),
            email: self.email.clone(),
        }
    }
}

/// Format epoch ms as `2024-01-01T00:00:00.000Z`
pub fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
