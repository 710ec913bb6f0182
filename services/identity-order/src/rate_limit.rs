//! Token-bucket rate limiting for credential endpoints
//!
//! Applied to login and verify-email attempts, keyed per identifier.
//! This is a hardening addition over the reference backend, which had
//! no limit on guessing codes or passwords.

use crate::error::AppError;
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Bucket {
    capacity: u32,
    tokens: f64,
    refill_rate: f64,
    last_update: Instant,
}

impl Bucket {
    fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            capacity,
            tokens: capacity as f64,
            refill_rate,
            last_update: Instant::now(),
        }
    }

    fn allow_request(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = f64::min(self.capacity as f64, self.tokens + elapsed * self.refill_rate);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

pub struct RateLimiter {
    // Maps keys like "login:<identifier>" to their bucket
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    pub fn check(&self, key: &str, capacity: u32, refill_rate: f64) -> Result<(), AppError> {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(capacity, refill_rate));

        if bucket.allow_request() {
            Ok(())
        } else {
            Err(AppError::RateLimitExceeded(
                "Too many attempts, try again later".to_string(),
            ))
        }
    }

    /// Drop buckets idle longer than `max_idle`. Keys are chosen by
    /// clients, so without this the map grows without bound on a
    /// long-lived process.
    pub fn sweep(&self, max_idle: Duration) {
        let now = Instant::now();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.last_update) < max_idle);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
