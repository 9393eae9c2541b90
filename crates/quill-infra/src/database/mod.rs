//! Database connection management and PostgreSQL repositories.

mod connections;
pub mod entity;
mod postgres_base;
pub mod postgres_repo;

pub use connections::{DatabaseConfig, connect};
pub use postgres_repo::{
    PostgresCommentRepository, PostgresPostRepository, PostgresTagRepository,
    PostgresUserRepository,
};

#[cfg(test)]
mod tests;
