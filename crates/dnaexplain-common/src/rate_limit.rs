//! Sliding-window rate limiting keyed by `feature:identifier`.
//!
//! Best-effort and per-process: buckets live in memory and reset on restart.
//! Callers hold a `dyn RateLimitStore` so a shared backing store can replace the
//! in-memory one without changing the `check` contract.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max: u32,
}

impl RateLimitConfig {
    pub fn per_minute(max: u32) -> Self {
        Self { window: Duration::from_secs(60), max: max.max(1) }
    }

    pub fn per_second(max: u32) -> Self {
        Self { window: Duration::from_secs(1), max: max.max(1) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Milliseconds until the oldest counted request leaves the window.
    pub reset_ms: u64,
}

impl RateLimitDecision {
    /// Whole seconds to wait before retrying, rounded up.
    pub fn retry_after_secs(&self) -> u64 {
        self.reset_ms.div_ceil(1000)
    }
}

pub trait RateLimitStore: Send + Sync {
    /// Admission check at an explicit instant. Records `now` when allowed.
    fn check_at(&self, key: &str, cfg: RateLimitConfig, now: Instant) -> RateLimitDecision;

    fn check(&self, key: &str, cfg: RateLimitConfig) -> RateLimitDecision {
        self.check_at(key, cfg, Instant::now())
    }

    /// Forget keys with no request left in their window. Returns how many
    /// keys were dropped.
    fn sweep_at(&self, now: Instant) -> usize;

    fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }
}

#[derive(Debug)]
struct Bucket {
    window: Duration,
    hits: Vec<Instant>,
}

impl Bucket {
    fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.hits.retain(|ts| now.duration_since(*ts) < window);
    }
}

/// Process-local store: one timestamp list per key behind a mutex, so
/// concurrent admission checks on the same key cannot lose updates.
#[derive(Debug, Default)]
pub struct InMemoryRateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

fn reset_ms(window: Duration, oldest: Instant, now: Instant) -> u64 {
    window.saturating_sub(now.duration_since(oldest)).as_millis() as u64
}

impl RateLimitStore for InMemoryRateLimiter {
    fn check_at(&self, key: &str, cfg: RateLimitConfig, now: Instant) -> RateLimitDecision {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket { window: cfg.window, hits: Vec::new() });
        bucket.window = cfg.window;

        // Drop entries that have left the window
        bucket.prune(now);

        if bucket.hits.len() as u32 >= cfg.max {
            let oldest = bucket.hits.first().copied().unwrap_or(now);
            return RateLimitDecision {
                allowed: false,
                limit: cfg.max,
                remaining: 0,
                reset_ms: reset_ms(cfg.window, oldest, now),
            };
        }

        bucket.hits.push(now);
        let oldest = bucket.hits.first().copied().unwrap_or(now);

        RateLimitDecision {
            allowed: true,
            limit: cfg.max,
            remaining: cfg.max.saturating_sub(bucket.hits.len() as u32),
            reset_ms: reset_ms(cfg.window, oldest, now),
        }
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let before = buckets.len();
        buckets.retain(|_, bucket| {
            bucket.prune(now);
            !bucket.hits.is_empty()
        });
        before - buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max: u32, window_ms: u64) -> RateLimitConfig {
        RateLimitConfig { window: Duration::from_millis(window_ms), max }
    }

    #[test]
    fn test_allows_under_limit() {
        let limiter = InMemoryRateLimiter::new();
        let now = Instant::now();
        let d = limiter.check_at("translate:1.2.3.4", cfg(3, 60_000), now);
        assert!(d.allowed);
        assert_eq!(d.limit, 3);
        assert_eq!(d.remaining, 2);
        assert_eq!(d.reset_ms, 60_000);
    }

    #[test]
    fn test_rejects_request_past_limit() {
        let limiter = InMemoryRateLimiter::new();
        let t0 = Instant::now();
        for i in 0..3 {
            let d = limiter.check_at("k", cfg(3, 1_000), t0 + Duration::from_millis(i * 100));
            assert!(d.allowed);
        }
        let d = limiter.check_at("k", cfg(3, 1_000), t0 + Duration::from_millis(400));
        assert!(!d.allowed);
        assert_eq!(d.remaining, 0);
        assert_eq!(d.reset_ms, 600);
        assert_eq!(d.retry_after_secs(), 1);
    }

    #[test]
    fn test_allowed_again_after_reset() {
        let limiter = InMemoryRateLimiter::new();
        let t0 = Instant::now();
        assert!(limiter.check_at("k", cfg(1, 500), t0).allowed);
        let blocked = limiter.check_at("k", cfg(1, 500), t0 + Duration::from_millis(200));
        assert!(!blocked.allowed);

        let later = t0 + Duration::from_millis(200 + blocked.reset_ms);
        assert!(limiter.check_at("k", cfg(1, 500), later).allowed);
    }

    #[test]
    fn test_rejected_request_is_not_recorded() {
        let limiter = InMemoryRateLimiter::new();
        let t0 = Instant::now();
        assert!(limiter.check_at("k", cfg(1, 1_000), t0).allowed);
        for i in 1..5 {
            assert!(!limiter.check_at("k", cfg(1, 1_000), t0 + Duration::from_millis(i * 10)).allowed);
        }
        assert!(limiter.check_at("k", cfg(1, 1_000), t0 + Duration::from_millis(1_000)).allowed);
    }

    #[test]
    fn test_keys_are_isolated() {
        let limiter = InMemoryRateLimiter::new();
        let now = Instant::now();
        assert!(limiter.check_at("literature:a", cfg(1, 60_000), now).allowed);
        assert!(limiter.check_at("literature:b", cfg(1, 60_000), now).allowed);
        assert!(limiter.check_at("translate:a", cfg(1, 60_000), now).allowed);
        assert!(!limiter.check_at("literature:a", cfg(1, 60_000), now).allowed);
        assert_eq!(limiter.tracked_keys(), 3);
    }

    #[test]
    fn test_sweep_drops_idle_clients() {
        let limiter = InMemoryRateLimiter::new();
        let t0 = Instant::now();
        for i in 0..50 {
            limiter.check_at(&format!("translate:10.0.0.{i}"), cfg(5, 1_000), t0);
        }
        limiter.check_at("translate:busy", cfg(5, 1_000), t0 + Duration::from_millis(900));
        assert_eq!(limiter.tracked_keys(), 51);

        assert_eq!(limiter.sweep_at(t0 + Duration::from_millis(1_000)), 50);
        assert_eq!(limiter.tracked_keys(), 1);
        assert_eq!(limiter.sweep_at(t0 + Duration::from_millis(1_900)), 1);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_sweep_keeps_counts_within_window() {
        let limiter = InMemoryRateLimiter::new();
        let t0 = Instant::now();
        assert!(limiter.check_at("k", cfg(1, 1_000), t0).allowed);
        assert_eq!(limiter.sweep_at(t0 + Duration::from_millis(500)), 0);
        assert!(!limiter.check_at("k", cfg(1, 1_000), t0 + Duration::from_millis(600)).allowed);
    }

    #[test]
    fn test_zero_max_is_clamped() {
        assert_eq!(RateLimitConfig::per_minute(0).max, 1);
    }
}
