//! HTTP response types for the canary console

use actix_web::{HttpResponse, HttpResponseBuilder, http::StatusCode};
use canary_common::error::{ErrorCode, SUCCESS};
use serde::{Deserialize, Serialize};

/// Generic result wrapper for API responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestResult<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> RestResult<T> {
    pub fn success(data: T) -> RestResult<T> {
        RestResult::<T> {
            code: SUCCESS.code,
            message: SUCCESS.message.to_string(),
            data,
        }
    }

    pub fn http_success(data: impl Serialize) -> HttpResponse {
        HttpResponse::Ok().json(RestResult::success(data))
    }
}

/// Error body for API error responses.
///
/// The console UI reads the `error` field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResult {
    pub code: i32,
    pub error: String,
}

impl ErrorResult {
    pub fn new(code: ErrorCode<'_>, error: impl Into<String>) -> Self {
        ErrorResult {
            code: code.code,
            error: error.into(),
        }
    }

    pub fn http_response(status: u16, code: ErrorCode<'_>, error: impl Into<String>) -> HttpResponse {
        HttpResponseBuilder::new(
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        )
        .json(ErrorResult::new(code, error))
    }
}

/// Body returned to any gated request while the process is draining
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrainingBody {
    pub status: String,
    pub message: String,
}

impl Default for DrainingBody {
    fn default() -> Self {
        DrainingBody {
            status: "draining".to_string(),
            message: "service is draining".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canary_common::error::RESOURCE_CONFLICT;

    #[test]
    fn test_success_wraps_data() {
        let result = RestResult::success(vec!["a"]);
        assert_eq!(result.code, 0);
        assert_eq!(result.message, "success");
        assert_eq!(result.data, vec!["a"]);
    }

    #[test]
    fn test_error_response_status() {
        let response = ErrorResult::http_response(403, RESOURCE_CONFLICT, "locked");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = ErrorResult::http_response(1000, RESOURCE_CONFLICT, "bogus");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_draining_body_shape() {
        let json = serde_json::to_value(DrainingBody::default()).unwrap();
        assert_eq!(json["status"], "draining");
        assert_eq!(json["message"], "service is draining");
    }
}
