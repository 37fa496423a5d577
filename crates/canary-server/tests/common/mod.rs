//! Shared fixtures for HTTP surface tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use canary_common::CanaryError;
use canary_core::ingress::{ANNOTATION_CANARY, ANNOTATION_WEIGHT};
use canary_core::{CanaryIngress, DrainController, IngressClient, LockTable, ResourceKey};
use canary_server::model::{app_state::AppState, config::Configuration};

pub const IDENTITY_HEADER: &str = "X-Forwarded-User";

/// In-memory ingress store standing in for the Kubernetes API
#[derive(Default)]
pub struct FakeIngressClient {
    annotations: Mutex<BTreeMap<ResourceKey, BTreeMap<String, String>>>,
    failing: AtomicBool,
}

impl FakeIngressClient {
    pub fn with_canaries(keys: &[&str]) -> Self {
        let client = Self::default();
        {
            let mut store = client.annotations.lock().unwrap();
            for key in keys {
                let mut annotations = BTreeMap::new();
                annotations.insert(ANNOTATION_CANARY.to_string(), "true".to_string());
                annotations.insert(ANNOTATION_WEIGHT.to_string(), "0".to_string());
                store.insert(key.parse().unwrap(), annotations);
            }
        }
        client
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn annotations(&self, key: &str) -> BTreeMap<String, String> {
        let key: ResourceKey = key.parse().unwrap();
        self.annotations
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl IngressClient for FakeIngressClient {
    async fn list_canary_ingresses(&self) -> Result<Vec<CanaryIngress>, CanaryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CanaryError::ResourceClient("connection refused".to_string()));
        }
        let store = self.annotations.lock().unwrap();
        Ok(store
            .iter()
            .filter_map(|(key, annotations)| {
                CanaryIngress::from_annotations(&key.namespace, &key.name, annotations, vec![])
            })
            .collect())
    }

    async fn annotate(
        &self,
        key: &ResourceKey,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), CanaryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CanaryError::ResourceClient("connection refused".to_string()));
        }
        let mut store = self.annotations.lock().unwrap();
        let entry = store
            .get_mut(key)
            .ok_or_else(|| CanaryError::ResourceClient(format!("ingress {} not found", key)))?;
        entry.extend(annotations.clone());
        Ok(())
    }
}

pub struct TestContext {
    pub state: Arc<AppState>,
    pub client: Arc<FakeIngressClient>,
}

impl TestContext {
    pub fn new(client: FakeIngressClient) -> Self {
        let client = Arc::new(client);
        let state = Arc::new(AppState::new(
            Configuration::default(),
            Arc::new(LockTable::with_ttl(Duration::from_secs(3600))),
            Arc::new(DrainController::default()),
            client.clone(),
        ));
        Self { state, client }
    }

    pub fn drain(&self) -> &Arc<DrainController> {
        &self.state.drain
    }
}

/// Build the console app the same way the server does.
macro_rules! console_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(canary_server::middleware::Identity::new(
                    common::IDENTITY_HEADER,
                ))
                .wrap(canary_server::middleware::DrainGate::new(
                    $ctx.state.drain.clone(),
                ))
                .app_data(actix_web::web::Data::from($ctx.state.clone()))
                .configure(canary_server::api::route::routes),
        )
        .await
    };
}
