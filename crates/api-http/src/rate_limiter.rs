//! Rate Limiter (Token Bucket Algorithm)
//!
//! Caps the submission rate on `POST /yt`. Lock-free: bucket state lives in
//! one `AtomicU64`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Token bucket shared by every request handler
pub struct RateLimiter {
    // Upper 32 bits: available tokens
    // Lower 32 bits: last refill, milliseconds since `origin`
    packed: AtomicU64,
    origin: Instant,
    burst: u32,
    per_second: u32,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `burst` - Bucket size (0 disables limiting)
    /// * `per_second` - Tokens added per second
    ///
    /// # Example
    /// Allow 100 submissions/sec with burst of 200:
    /// `RateLimiter::new(200, 100)`
    pub fn new(burst: u32, per_second: u32) -> Self {
        Self {
            packed: AtomicU64::new(pack(burst, 0)),
            origin: Instant::now(),
            burst,
            per_second,
        }
    }

    /// Limiter that admits everything
    pub fn unlimited() -> Self {
        Self::new(0, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.burst > 0
    }

    /// Take one token; `false` means the caller is over the limit
    pub fn try_acquire(&self) -> bool {
        let now_ms = self.origin.elapsed().as_millis().min(u32::MAX as u128) as u32;
        self.try_acquire_at(now_ms)
    }

    fn try_acquire_at(&self, now_ms: u32) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let mut current = self.packed.load(Ordering::Acquire);

        loop {
            let (tokens, last_ms) = unpack(current);
            let elapsed = now_ms.saturating_sub(last_ms) as u64;
            let refill = elapsed * self.per_second as u64 / 1000;
            let available = (tokens as u64 + refill).min(self.burst as u64) as u32;

            // Advance the clock by what the credited tokens cost so the
            // remainder keeps accruing. A full bucket drops the surplus.
            let stamp = if tokens as u64 + refill >= self.burst as u64 {
                now_ms
            } else if refill > 0 {
                let cost = (refill * 1000).div_ceil(self.per_second as u64);
                last_ms.saturating_add(cost as u32)
            } else {
                last_ms
            };

            let (next, admitted) = if available > 0 {
                (pack(available - 1, stamp), true)
            } else {
                (pack(0, stamp), false)
            };

            match self.packed.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return admitted,
                Err(actual) => current = actual,
            }
        }
    }

    /// Tokens currently in the bucket (without refill)
    pub fn remaining(&self) -> u32 {
        unpack(self.packed.load(Ordering::Acquire)).0
    }
}

fn pack(tokens: u32, stamp_ms: u32) -> u64 {
    ((tokens as u64) << 32) | stamp_ms as u64
}

fn unpack(packed: u64) -> (u32, u32) {
    ((packed >> 32) as u32, (packed & 0xFFFF_FFFF) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_allows_burst_then_denies() {
        let limiter = RateLimiter::new(10, 1);

        for _ in 0..10 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.remaining(), 0);
    }

    #[test]
    fn test_refills_over_time() {
        let limiter = RateLimiter::new(5, 20); // one token per 50ms

        for _ in 0..5 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());

        std::thread::sleep(Duration::from_millis(120));
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_partial_refill_carries_over() {
        let limiter = RateLimiter::new(5, 3); // one token per 333.3ms

        for _ in 0..5 {
            assert!(limiter.try_acquire_at(0));
        }
        assert!(!limiter.try_acquire_at(300));

        // One token is credited at 400ms; the 66ms past its cost still count
        assert!(limiter.try_acquire_at(400));
        assert!(limiter.try_acquire_at(700));
        assert!(!limiter.try_acquire_at(700));
    }

    #[test]
    fn test_sustained_rate_matches_configuration() {
        let limiter = RateLimiter::new(20, 4); // one token per 250ms
        for _ in 0..20 {
            assert!(limiter.try_acquire_at(0));
        }

        // 3s at 4/s credits 12 tokens even when polled every 300ms
        let admitted = (1..=10).filter(|i| limiter.try_acquire_at(i * 300)).count();
        assert_eq!(admitted, 10);
        assert_eq!(limiter.remaining(), 2);
    }

    #[test]
    fn test_unlimited_never_denies() {
        let limiter = RateLimiter::unlimited();
        assert!((0..10_000).all(|_| limiter.try_acquire()));
    }

    #[test]
    fn test_concurrent_acquire_respects_burst() {
        let limiter = Arc::new(RateLimiter::new(100, 1));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || (0..20).filter(|_| limiter.try_acquire()).count())
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        // 200 attempts against a bucket of 100; at most a couple of refills
        assert!(total >= 100, "expected the full burst, got {}", total);
        assert!(total <= 102, "expected at most ~100 admitted, got {}", total);
    }
}
