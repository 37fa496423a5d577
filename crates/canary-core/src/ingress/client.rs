use std::collections::BTreeMap;

use async_trait::async_trait;
use canary_common::CanaryError;

use super::{CanaryIngress, ResourceKey};

/// Access to the ingress objects being coordinated over.
///
/// Calls may be slow or fail transiently. They are never made while a lock
/// table or drain controller mutex is held, and failures are reported as
/// `CanaryError::ResourceClient` without being retried here.
#[async_trait]
pub trait IngressClient: Send + Sync {
    /// All ingresses marked as canaries, across namespaces
    async fn list_canary_ingresses(&self) -> Result<Vec<CanaryIngress>, CanaryError>;

    /// Merge `annotations` into the ingress' metadata
    async fn annotate(
        &self,
        key: &ResourceKey,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), CanaryError>;
}
