//! Per-key rate limiter using the governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota};

use quill_core::ports::{RateLimitResult, RateLimiter};

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
        }
    }
}

/// GCRA rate limiter with one quota bucket per key (client IP).
///
/// Limits are per-process, not distributed across instances.
pub struct KeyedRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    config: RateLimitConfig,
}

impl KeyedRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let max = NonZeroU32::new(config.max_requests.max(1)).expect("non-zero after max(1)");
        let quota = Quota::with_period(config.window / config.max_requests.max(1))
            .expect("window is non-zero")
            .allow_burst(max);

        Self {
            limiter: DefaultKeyedRateLimiter::keyed(quota),
            config,
        }
    }

    pub fn from_env() -> Self {
        let config = RateLimitConfig {
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            window: Duration::from_secs(
                std::env::var("RATE_LIMIT_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        };
        Self::new(config)
    }
}

impl RateLimiter for KeyedRateLimiter {
    fn check(&self, key: &str) -> RateLimitResult {
        match self.limiter.check_key(&key.to_string()) {
            Ok(_) => RateLimitResult {
                allowed: true,
                reset_after: self.config.window,
            },
            Err(not_until) => RateLimitResult {
                allowed: false,
                reset_after: not_until.wait_time_from(DefaultClock::default().now()),
            },
        }
    }
}
