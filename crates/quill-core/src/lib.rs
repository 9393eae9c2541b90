//! # Quill Core
//!
//! The domain layer of the Quill blogging platform.
//! This crate contains pure business logic with zero infrastructure
//! dependencies: the entities, the ports infrastructure must implement,
//! and the two components that own the platform's consistency rules —
//! the tag ledger and the post lifecycle service.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
