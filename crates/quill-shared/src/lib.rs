//! # Quill Shared
//!
//! Wire types shared between the backend and any client: request/response
//! DTOs and the RFC 7807 error envelope.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse, FieldErrorEntry};
