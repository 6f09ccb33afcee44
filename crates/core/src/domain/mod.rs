// Domain Layer - Pure business logic and entities

pub mod error;
pub mod event;
pub mod job;

// Re-exports
pub use error::DomainError;
pub use event::{Event, SubmitEvent, YT_SUBMIT_TOPIC};
pub use job::{format_timestamp, job_key, JobId, JobRecord, JobState, JOB_ID_PREFIX, JOB_KEY_PREFIX};
