//! Rate limiter for the simulator REST API.
//!
//! The case server throttles per API key; reads and order submissions are
//! budgeted separately so a burst of hedge orders cannot starve tick polling.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = GovLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Dual rate limiter with separate buckets for reads and writes.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    read_limiter: Arc<DirectLimiter>,
    write_limiter: Arc<DirectLimiter>,
}

impl RateLimiter {
    /// Create with the simulator's default limits.
    pub fn new() -> Self {
        Self::with_limits(50, 20)
    }

    /// Create with custom per-second limits. Zero is clamped to one.
    pub fn with_limits(reads_per_sec: u32, writes_per_sec: u32) -> Self {
        let per_sec = |n: u32| NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN);

        Self {
            read_limiter: Arc::new(GovLimiter::direct(Quota::per_second(per_sec(reads_per_sec)))),
            write_limiter: Arc::new(GovLimiter::direct(Quota::per_second(per_sec(
                writes_per_sec,
            )))),
        }
    }

    /// Wait until a read slot is available.
    pub async fn wait_read(&self) {
        self.read_limiter.until_ready().await;
    }

    /// Wait until a write slot is available.
    pub async fn wait_write(&self) {
        self.write_limiter.until_ready().await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_limits_are_clamped_and_usable() {
        let limiter = RateLimiter::with_limits(0, 0);
        limiter.wait_read().await;
        limiter.wait_write().await;
    }
}
