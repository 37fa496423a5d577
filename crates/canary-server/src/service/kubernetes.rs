//! Kubernetes-backed ingress client
//!
//! Reads canary ingresses across all namespaces and writes canary annotations
//! with a JSON merge patch on `metadata.annotations`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use canary_common::CanaryError;
use canary_core::{CanaryIngress, IngressClient, ResourceKey};
use k8s_openapi::api::networking::v1::Ingress;
use kube::{
    Api, Client, Config,
    api::{ListParams, Patch, PatchParams},
    config::{KubeConfigOptions, Kubeconfig},
};
use serde_json::json;
use tracing::{debug, error, info};

use crate::metrics::{self, Timer};

/// [`IngressClient`] talking to the Kubernetes API server
#[derive(Clone)]
pub struct KubeIngressClient {
    client: Client,
}

impl KubeIngressClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the in-cluster service account, falling back to a kubeconfig.
    ///
    /// An explicit `kubeconfig` path takes precedence over default discovery
    /// (`KUBECONFIG`, then `~/.kube/config`).
    pub async fn connect(kubeconfig: Option<&str>) -> Result<Self, CanaryError> {
        let config = match Config::incluster() {
            Ok(config) => {
                info!("Using in-cluster Kubernetes configuration");
                config
            }
            Err(e) => {
                debug!(error = %e, "In-cluster configuration unavailable, falling back to kubeconfig");
                let options = KubeConfigOptions::default();
                let loaded = match kubeconfig {
                    Some(path) => {
                        let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                            CanaryError::Config(format!(
                                "Failed to read kubeconfig {}: {}",
                                path, e
                            ))
                        })?;
                        info!(path = %path, "Using kubeconfig file");
                        Config::from_custom_kubeconfig(kubeconfig, &options).await
                    }
                    None => Config::from_kubeconfig(&options).await,
                };
                loaded.map_err(|e| CanaryError::Config(format!("Failed to load kubeconfig: {}", e)))?
            }
        };

        let client = Client::try_from(config)
            .map_err(|e| CanaryError::Config(format!("Failed to create K8s client: {}", e)))?;
        Ok(Self::new(client))
    }
}

/// Canary view of an ingress, or `None` when it is not a canary
fn canary_from_ingress(ingress: &Ingress) -> Option<CanaryIngress> {
    let meta = &ingress.metadata;
    let name = meta.name.as_deref()?;
    let namespace = meta.namespace.as_deref().unwrap_or_default();
    let hosts = ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .map(|rules| rules.iter().filter_map(|rule| rule.host.clone()).collect())
        .unwrap_or_default();
    let annotations = meta.annotations.clone().unwrap_or_default();

    CanaryIngress::from_annotations(namespace, name, &annotations, hosts)
}

#[async_trait]
impl IngressClient for KubeIngressClient {
    async fn list_canary_ingresses(&self) -> Result<Vec<CanaryIngress>, CanaryError> {
        let api: Api<Ingress> = Api::all(self.client.clone());
        let timer = Timer::new();

        let result = api.list(&ListParams::default()).await;
        metrics::record_kube_request("list", timer.elapsed_secs(), result.is_ok());

        let list = result.map_err(|e| {
            error!(error = %e, "Failed to list ingresses");
            CanaryError::ResourceClient(format!("failed to list ingresses: {}", e))
        })?;

        let canaries: Vec<CanaryIngress> = list.items.iter().filter_map(canary_from_ingress).collect();
        debug!(
            total = list.items.len(),
            canaries = canaries.len(),
            "Listed ingresses"
        );
        Ok(canaries)
    }

    async fn annotate(
        &self,
        key: &ResourceKey,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), CanaryError> {
        let api: Api<Ingress> = Api::namespaced(self.client.clone(), &key.namespace);
        let patch = json!({ "metadata": { "annotations": annotations } });
        let timer = Timer::new();

        let result = api
            .patch(&key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await;
        metrics::record_kube_request("patch", timer.elapsed_secs(), result.is_ok());

        result.map_err(|e| {
            error!(key = %key, error = %e, "Failed to patch ingress annotations");
            CanaryError::ResourceClient(format!("failed to annotate ingress {}: {}", key, e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use canary_core::ingress::{ANNOTATION_CANARY, ANNOTATION_WEIGHT};
    use k8s_openapi::api::networking::v1::{IngressRule, IngressSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;

    fn ingress(name: &str, annotations: &[(&str, &str)], hosts: &[&str]) -> Ingress {
        Ingress {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("prod".to_string()),
                annotations: Some(
                    annotations
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: Some(
                    hosts
                        .iter()
                        .map(|h| IngressRule {
                            host: Some(h.to_string()),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_canary_ingress_is_extracted() {
        let ing = ingress(
            "web-canary",
            &[(ANNOTATION_CANARY, "true"), (ANNOTATION_WEIGHT, "25")],
            &["web.example.com", "www.example.com"],
        );
        let canary = canary_from_ingress(&ing).unwrap();
        assert_eq!(canary.namespace, "prod");
        assert_eq!(canary.name, "web-canary");
        assert_eq!(canary.weight, "25");
        assert_eq!(canary.hosts.len(), 2);
    }

    #[test]
    fn test_non_canary_ingress_is_skipped() {
        let plain = ingress("web", &[], &["web.example.com"]);
        assert!(canary_from_ingress(&plain).is_none());

        let disabled = ingress("web", &[(ANNOTATION_CANARY, "false")], &[]);
        assert!(canary_from_ingress(&disabled).is_none());
    }

    #[test]
    fn test_ingress_without_spec() {
        let mut ing = ingress("web-canary", &[(ANNOTATION_CANARY, "true")], &[]);
        ing.spec = None;
        let canary = canary_from_ingress(&ing).unwrap();
        assert!(canary.hosts.is_empty());
        assert_eq!(canary.weight, "0");
    }
}
