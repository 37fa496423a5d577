//! Canary ingress listing and annotation editing

use std::collections::BTreeMap;

use actix_web::{HttpResponse, get, web};
use canary_common::CanaryError;
use canary_core::{CanaryIngress, CanaryRule, ResourceKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::middleware::Caller;
use crate::model::app_state::AppState;
use crate::model::response::RestResult;

/// A canary ingress together with whoever is editing it
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressView {
    #[serde(flatten)]
    pub ingress: CanaryIngress,
    pub locked_by: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
    pub locked_by_me: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SetAnnotationsQuery {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub ingress: String,
    #[serde(flatten)]
    pub rule: CanaryRule,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnotatedView {
    pub namespace: String,
    pub ingress: String,
    pub annotations: BTreeMap<String, String>,
}

/// GET /ingresses
#[get("/ingresses")]
async fn list_ingresses(
    data: web::Data<AppState>,
    caller: Option<Caller>,
) -> Result<HttpResponse, AppError> {
    let ingresses = data.ingress_client.list_canary_ingresses().await?;
    let locks = data.lock_table.snapshot();

    let views: Vec<IngressView> = ingresses
        .into_iter()
        .map(|ingress| {
            let entry = locks.get(&ingress.key());
            IngressView {
                locked_by: entry.map(|e| e.owner.clone()),
                locked_at: entry.map(|e| e.acquired_at),
                locked_by_me: match (entry, &caller) {
                    (Some(e), Some(c)) => e.owner == c.name(),
                    _ => false,
                },
                ingress,
            }
        })
        .collect();

    Ok(RestResult::<Vec<IngressView>>::http_success(views))
}

/// GET /set_annotations
///
/// Only the holder of the ingress' lock may edit it. The lock is left in
/// place whether or not the cluster call succeeds.
#[get("/set_annotations")]
async fn set_annotations(
    data: web::Data<AppState>,
    caller: Caller,
    params: web::Query<SetAnnotationsQuery>,
) -> Result<HttpResponse, AppError> {
    let params = params.into_inner();
    let key = ResourceKey::from_params(&params.namespace, &params.ingress)?;

    if !data.lock_table.is_held_by(&key, caller.name()) {
        return Err(CanaryError::LockNotHeld(key.to_string()).into());
    }

    let annotations = params.rule.to_annotations()?;
    data.ingress_client.annotate(&key, &annotations).await?;

    info!(key = %key, owner = %caller, annotations = ?annotations, "Canary annotations updated");
    Ok(RestResult::<AnnotatedView>::http_success(AnnotatedView {
        namespace: key.namespace,
        ingress: key.name,
        annotations,
    }))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_ingresses).service(set_annotations);
}
