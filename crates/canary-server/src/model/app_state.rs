use std::sync::Arc;

use canary_core::{DrainController, IngressClient, LockTable};

use super::config::Configuration;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub configuration: Configuration,
    pub lock_table: Arc<LockTable>,
    pub drain: Arc<DrainController>,
    pub ingress_client: Arc<dyn IngressClient>,
}

impl AppState {
    pub fn new(
        configuration: Configuration,
        lock_table: Arc<LockTable>,
        drain: Arc<DrainController>,
        ingress_client: Arc<dyn IngressClient>,
    ) -> Self {
        AppState {
            configuration,
            lock_table,
            drain,
            ingress_client,
        }
    }
}
