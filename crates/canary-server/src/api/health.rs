//! Liveness and readiness probes
//!
//! Both endpoints bypass drain admission and never touch the in-flight count.

use actix_web::{HttpResponse, Responder, get, web};
use canary_core::DrainStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::app_state::AppState;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LivenessPayload {
    pub status: String,
}

/// Readiness report derived from the drain state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessPayload {
    pub ready: bool,
    pub draining: bool,
    pub in_flight: u64,
    pub drain_started_at: Option<DateTime<Utc>>,
    pub shutdown_reason: Option<String>,
}

impl From<DrainStatus> for ReadinessPayload {
    fn from(status: DrainStatus) -> Self {
        ReadinessPayload {
            ready: status.serving,
            draining: status.draining,
            in_flight: status.in_flight,
            drain_started_at: status.drain_started_at,
            shutdown_reason: status.reason,
        }
    }
}

/// GET /healthz
///
/// The process is alive; answered even while draining.
#[get("/healthz")]
async fn healthz() -> impl Responder {
    HttpResponse::Ok().json(LivenessPayload {
        status: "ok".to_string(),
    })
}

/// GET /readyz
///
/// 503 once draining starts so the orchestrator stops routing traffic here.
#[get("/readyz")]
async fn readyz(data: web::Data<AppState>) -> impl Responder {
    let payload = ReadinessPayload::from(data.drain.status());
    if payload.ready {
        HttpResponse::Ok().json(payload)
    } else {
        HttpResponse::ServiceUnavailable().json(payload)
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz).service(readyz);
}
