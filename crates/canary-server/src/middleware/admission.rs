//! Drain admission middleware
//!
//! Every request outside the probe endpoints is admitted through the
//! [`DrainController`] before it reaches a handler. Admitted requests are
//! counted as in-flight until their handler future resolves or is dropped;
//! while draining they are answered with 503 and never reach a handler.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use canary_core::DrainController;
use futures::future::LocalBoxFuture;
use tracing::debug;

use crate::metrics;
use crate::model::constants::DRAIN_EXEMPT_PATHS;
use crate::model::response::DrainingBody;

/// Middleware factory gating requests on the drain state.
pub struct DrainGate {
    drain: Arc<DrainController>,
}

impl DrainGate {
    pub fn new(drain: Arc<DrainController>) -> Self {
        Self { drain }
    }
}

impl<S, B> Transform<S, ServiceRequest> for DrainGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = DrainGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(DrainGateMiddleware {
            service,
            drain: self.drain.clone(),
        }))
    }
}

pub struct DrainGateMiddleware<S> {
    service: S,
    drain: Arc<DrainController>,
}

/// Probe endpoints bypass admission and are never counted as in-flight.
fn is_exempt_path(path: &str) -> bool {
    DRAIN_EXEMPT_PATHS.contains(&path)
}

impl<S, B> Service<ServiceRequest> for DrainGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_exempt_path(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(|res| res.map_into_left_body()) });
        }

        let Some(guard) = self.drain.enter() else {
            debug!(path = %req.path(), "Rejecting request while draining");
            metrics::record_request_rejected();
            let response = HttpResponse::ServiceUnavailable().json(DrainingBody::default());
            return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
        };
        metrics::set_in_flight(self.drain.in_flight());

        let drain = self.drain.clone();
        let fut = self.service.call(req);
        Box::pin(async move {
            let result = fut.await;
            drop(guard);
            metrics::set_in_flight(drain.in_flight());
            result.map(|res| res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};

    use super::*;

    #[::core::prelude::v1::test]
    fn test_exempt_paths() {
        assert!(is_exempt_path("/healthz"));
        assert!(is_exempt_path("/readyz"));
        assert!(!is_exempt_path("/healthz/extra"));
        assert!(!is_exempt_path("/lock"));
        assert!(!is_exempt_path("/"));
    }

    #[actix_web::test]
    async fn test_in_flight_counted_during_handler() {
        let drain = Arc::new(DrainController::default());
        let observed = drain.clone();
        let app = test::init_service(
            App::new().wrap(DrainGate::new(drain.clone())).route(
                "/work",
                web::get().to(move || {
                    let observed = observed.clone();
                    async move { HttpResponse::Ok().body(observed.in_flight().to_string()) }
                }),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/work").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"1"));
        assert_eq!(drain.in_flight(), 0);
    }

    #[actix_web::test]
    async fn test_rejects_while_draining() {
        let drain = Arc::new(DrainController::default());
        let app = test::init_service(
            App::new()
                .wrap(DrainGate::new(drain.clone()))
                .route("/work", web::get().to(|| async { HttpResponse::Ok().finish() }))
                .route("/healthz", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        drain.trigger_drain("manual");

        let req = test::TestRequest::get().uri("/work").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "draining");

        let req = test::TestRequest::get().uri("/healthz").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(drain.in_flight(), 0);
    }
}
