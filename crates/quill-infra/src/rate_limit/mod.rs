//! Keyed rate limiting via the governor crate.

mod keyed;

pub use keyed::{KeyedRateLimiter, RateLimitConfig};
