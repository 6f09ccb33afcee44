// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod reconcile;
pub mod shutdown;
pub mod submission;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use reconcile::{ReconcileReport, ReconcileService};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use submission::SubmissionService;
