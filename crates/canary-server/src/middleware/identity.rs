// Caller identity middleware for Actix-web
// Reads the operator name forwarded by the authenticating proxy and attaches
// it to the request so lock and mutation handlers can extract it.

use std::fmt;
use std::future::{Ready, ready};
use std::rc::Rc;

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use canary_common::CanaryError;
use futures::future::LocalBoxFuture;

use crate::error::AppError;

/// Identity of the operator making a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(String);

impl Caller {
    pub fn new(name: impl Into<String>) -> Self {
        Caller(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the caller attached by [`Identity`], failing with 401 when absent.
impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Caller>()
                .cloned()
                .ok_or_else(|| CanaryError::MissingIdentity.into()),
        )
    }
}

// Identity middleware transformer
pub struct Identity {
    header: Rc<str>,
}

impl Identity {
    pub fn new(header: impl AsRef<str>) -> Self {
        Self {
            header: Rc::from(header.as_ref()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Identity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddleware {
            service,
            header: self.header.clone(),
        }))
    }
}

pub struct IdentityMiddleware<S> {
    service: S,
    header: Rc<str>,
}

fn extract_caller(req: &ServiceRequest, header: &str) -> Option<Caller> {
    let value = req.headers().get(header)?.to_str().ok()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(Caller::new(value))
    }
}

impl<S, B> Service<ServiceRequest> for IdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(caller) = extract_caller(&req, &self.header) {
            req.extensions_mut().insert(caller);
        }

        let fut = self.service.call(req);
        Box::pin(fut)
    }
}
