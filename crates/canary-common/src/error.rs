//! Error types and error codes for the canary console
//!
//! This module defines:
//! - `CanaryError`: application-specific error enum
//! - `ErrorCode`: structured error codes for API responses

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CanaryError {
    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("ingress {key} is locked by {holder}")]
    LockConflict { key: String, holder: String },

    #[error("lock ingress {0} before modifying it")]
    LockNotHeld(String),

    #[error("caller identity is missing")]
    MissingIdentity,

    #[error("service is draining")]
    Draining,

    #[error("resource client error: {0}")]
    ResourceClient(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CanaryError {
    /// HTTP status the request surface answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CanaryError::IllegalArgument(_) => 400,
            CanaryError::MissingIdentity => 401,
            CanaryError::LockConflict { .. } | CanaryError::LockNotHeld(_) => 403,
            CanaryError::ResourceClient(_) => 502,
            CanaryError::Draining => 503,
            CanaryError::Config(_) | CanaryError::Internal(_) => 500,
        }
    }

    /// Structured error code reported in response bodies.
    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            CanaryError::IllegalArgument(_) => PARAMETER_VALIDATE_ERROR,
            CanaryError::MissingIdentity => IDENTITY_MISSING,
            CanaryError::LockConflict { .. } => RESOURCE_CONFLICT,
            CanaryError::LockNotHeld(_) => LOCK_NOT_HELD,
            CanaryError::ResourceClient(_) => RESOURCE_CLIENT_ERROR,
            CanaryError::Draining => SERVICE_DRAINING,
            CanaryError::Config(_) | CanaryError::Internal(_) => SERVER_ERROR,
        }
    }

    /// Expected, user-facing outcomes that must not be logged as faults.
    pub fn is_expected(&self) -> bool {
        self.status_code() < 500 || matches!(self, CanaryError::Draining)
    }
}

/// Error code structure for API responses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const IDENTITY_MISSING: ErrorCode<'static> = ErrorCode {
    code: 10003,
    message: "caller identity missing",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource conflict",
};

pub const LOCK_NOT_HELD: ErrorCode<'static> = ErrorCode {
    code: 20006,
    message: "lock not held",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};

pub const RESOURCE_CLIENT_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30001,
    message: "resource client error",
};

pub const SERVICE_DRAINING: ErrorCode<'static> = ErrorCode {
    code: 30002,
    message: "service draining",
};
