// Application constants (No magic values)

/// Message returned with every accepted submission
pub const SUBMIT_ACK_MESSAGE: &str = "Request submitted!";

/// Default reconciliation window for undelivered submissions (1 hour)
pub const DEFAULT_RECONCILE_WINDOW_MS: i64 = 60 * 60 * 1000;
