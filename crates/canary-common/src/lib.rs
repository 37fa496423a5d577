//! Canary Common - shared error types for the canary ingress console
//!
//! This crate provides the error taxonomy used by the coordination core and
//! the HTTP surface:
//! - `CanaryError`: application-specific error enum
//! - `ErrorCode`: structured error codes for API responses

pub mod error;

pub use error::{CanaryError, ErrorCode};
