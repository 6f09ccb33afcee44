// Clock port

/// Wall clock in epoch milliseconds
///
/// Feeds `createdAt`, timestamp ids and the reconciliation window.
pub trait TimeProvider: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Real clock
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Fixed clock (tests and replay)
pub struct FixedTimeProvider(pub i64);

impl TimeProvider for FixedTimeProvider {
    fn now_millis(&self) -> i64 {
        self.0
    }
}
