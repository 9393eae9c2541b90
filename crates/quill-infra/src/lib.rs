//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`:
//! PostgreSQL repositories via SeaORM, JWT + Argon2 authentication, a
//! keyed rate limiter, the OpenAI-compatible generation client, and
//! local-disk file storage.

pub mod ai;
pub mod auth;
pub mod database;
pub mod rate_limit;
pub mod storage;

pub use ai::{OpenAiConfig, OpenAiGenerator};
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{
    DatabaseConfig, PostgresCommentRepository, PostgresPostRepository, PostgresTagRepository,
    PostgresUserRepository, connect,
};
pub use rate_limit::{KeyedRateLimiter, RateLimitConfig};
pub use storage::LocalFileStorage;
