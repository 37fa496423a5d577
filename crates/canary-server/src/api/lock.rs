//! Ingress edit lock endpoints
//!
//! An operator locks an ingress before editing its canary annotations, and
//! unlocks it when done. Locks expire on their own after the configured TTL.

use actix_web::{HttpResponse, Responder, get, post, web};
use canary_common::CanaryError;
use canary_core::{AcquireOutcome, ReleaseOutcome, ResourceKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::metrics;
use crate::middleware::Caller;
use crate::model::app_state::AppState;
use crate::model::response::RestResult;

/// Form posted by the console's lock/unlock buttons
#[derive(Debug, Default, Deserialize)]
pub struct LockForm {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub ingress: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockView {
    pub namespace: String,
    pub ingress: String,
    pub owner: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnlockView {
    pub namespace: String,
    pub ingress: String,
    pub released: bool,
}

/// POST /lock
#[post("/lock")]
async fn lock(
    data: web::Data<AppState>,
    caller: Caller,
    form: web::Form<LockForm>,
) -> Result<HttpResponse, AppError> {
    let key = ResourceKey::from_params(&form.namespace, &form.ingress)?;
    let table = &data.lock_table;

    let outcome = table.acquire(&key, caller.name());
    metrics::record_lock_acquire(outcome.is_granted());
    metrics::set_locks_held(table.len());

    match outcome {
        AcquireOutcome::Granted(entry) => {
            info!(key = %key, owner = %caller, "Ingress locked");
            Ok(RestResult::<LockView>::http_success(LockView {
                namespace: key.namespace,
                ingress: key.name,
                owner: entry.owner,
                acquired_at: entry.acquired_at,
                expires_at: entry.acquired_at.checked_add_signed(table.ttl()),
            }))
        }
        AcquireOutcome::Denied { holder } => Err(CanaryError::LockConflict {
            key: key.to_string(),
            holder,
        }
        .into()),
    }
}

/// POST /unlock
///
/// Releasing a lock the caller does not hold is a no-op, not an error.
#[post("/unlock")]
async fn unlock(
    data: web::Data<AppState>,
    caller: Caller,
    form: web::Form<LockForm>,
) -> Result<HttpResponse, AppError> {
    let key = ResourceKey::from_params(&form.namespace, &form.ingress)?;
    let table = &data.lock_table;

    let released = table.release(&key, caller.name()) == ReleaseOutcome::Released;
    metrics::record_lock_release(released);
    metrics::set_locks_held(table.len());
    if released {
        info!(key = %key, owner = %caller, "Ingress unlocked");
    }

    Ok(RestResult::<UnlockView>::http_success(UnlockView {
        namespace: key.namespace,
        ingress: key.name,
        released,
    }))
}

/// GET /locks
#[get("/locks")]
async fn list_locks(data: web::Data<AppState>) -> impl Responder {
    let ttl = data.lock_table.ttl();
    let locks: Vec<LockView> = data
        .lock_table
        .snapshot()
        .into_iter()
        .map(|(key, entry)| LockView {
            namespace: key.namespace,
            ingress: key.name,
            owner: entry.owner,
            acquired_at: entry.acquired_at,
            expires_at: entry.acquired_at.checked_add_signed(ttl),
        })
        .collect();

    RestResult::<Vec<LockView>>::http_success(locks)
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(lock).service(unlock).service(list_locks);
}
