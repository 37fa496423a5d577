//! Administrative endpoints

use actix_web::{Responder, post, web};
use serde::Deserialize;
use tracing::info;

use crate::api::health::ReadinessPayload;
use crate::middleware::Caller;
use crate::model::app_state::AppState;
use crate::model::response::RestResult;

const DEFAULT_DRAIN_REASON: &str = "manual";

#[derive(Debug, Default, Deserialize)]
pub struct DrainParams {
    pub reason: Option<String>,
}

/// POST /admin/drain
///
/// Starts draining without stopping the process; the orchestrator is expected
/// to follow up with SIGTERM once readiness has failed. Requires a caller
/// identity; the default reason is `manual:<caller>`.
#[post("/drain")]
async fn drain(
    data: web::Data<AppState>,
    caller: Caller,
    query: web::Query<DrainParams>,
    form: Option<web::Form<DrainParams>>,
) -> impl Responder {
    let requested = form
        .and_then(|f| f.into_inner().reason)
        .or_else(|| query.into_inner().reason);
    let reason = requested
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}:{}", DEFAULT_DRAIN_REASON, caller));

    if data.drain.trigger_drain(reason.as_str()) {
        info!(reason = %reason, caller = %caller, "Drain requested through admin endpoint");
    }

    RestResult::<ReadinessPayload>::http_success(ReadinessPayload::from(data.drain.status()))
}

pub fn routes() -> actix_web::Scope {
    web::scope("/admin").service(drain)
}
