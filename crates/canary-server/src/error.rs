// Actix-web error mapping for the canary console

use std::fmt::{Display, Formatter};

use actix_web::{HttpResponse, http::StatusCode};
use canary_common::CanaryError;
use canary_common::error::SERVER_ERROR;
use tracing::{error, warn};

use crate::model::response::ErrorResult;

// Local wrapper so actix-web's ResponseError can be implemented
// (orphan rules forbid implementing it on anyhow::Error directly)
#[derive(Debug)]
pub struct AppError {
    inner: anyhow::Error,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError { inner: value }
    }
}

impl From<CanaryError> for AppError {
    fn from(value: CanaryError) -> Self {
        AppError {
            inner: value.into(),
        }
    }
}

impl AppError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn downcast_ref<E: std::error::Error + Send + Sync + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }
}

impl actix_web::error::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.downcast_ref::<CanaryError>()
            .and_then(|e| StatusCode::from_u16(e.status_code()).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        match self.downcast_ref::<CanaryError>() {
            Some(e) => {
                if e.is_expected() {
                    warn!(error = %e, "Request rejected");
                } else {
                    error!(error = %e, "Request failed");
                }
                ErrorResult::http_response(e.status_code(), e.error_code(), e.to_string())
            }
            None => {
                error!(error = ?self.inner, "Unhandled error");
                ErrorResult::http_response(500, SERVER_ERROR, self.inner.to_string())
            }
        }
    }
}
