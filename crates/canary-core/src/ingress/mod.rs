//! Canary ingress model
//!
//! Canary routing on ingress-nginx is driven entirely by annotations on the
//! canary ingress object. This module names those annotations, models the
//! values read back from the cluster, and turns an operator's edit into the
//! annotation map written by the resource client.

mod client;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use canary_common::CanaryError;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use client::IngressClient;

pub const ANNOTATION_CANARY: &str = "nginx.ingress.kubernetes.io/canary";
pub const ANNOTATION_WEIGHT: &str = "nginx.ingress.kubernetes.io/canary-weight";
pub const ANNOTATION_BY_HEADER: &str = "nginx.ingress.kubernetes.io/canary-by-header";
pub const ANNOTATION_BY_HEADER_VALUE: &str = "nginx.ingress.kubernetes.io/canary-by-header-value";
pub const ANNOTATION_BY_HEADER_PATTERN: &str =
    "nginx.ingress.kubernetes.io/canary-by-header-pattern";
pub const ANNOTATION_BY_COOKIE: &str = "nginx.ingress.kubernetes.io/canary-by-cookie";

pub const MAX_WEIGHT: u32 = 100;

/// Identifies an ingress by namespace and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Build a key from request parameters, rejecting blanks.
    pub fn from_params(namespace: &str, name: &str) -> Result<Self, CanaryError> {
        let namespace = namespace.trim();
        let name = name.trim();
        if namespace.is_empty() {
            return Err(CanaryError::IllegalArgument(
                "Required parameter 'namespace' is missing".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(CanaryError::IllegalArgument(
                "Required parameter 'ingress' is missing".to_string(),
            ));
        }
        Ok(Self::new(namespace, name))
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ResourceKey {
    type Err = CanaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name)) => Self::from_params(namespace, name),
            None => Err(CanaryError::IllegalArgument(format!(
                "resource key '{}' must be namespace/name",
                s
            ))),
        }
    }
}

/// A canary ingress as read from the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanaryIngress {
    pub namespace: String,
    pub name: String,
    pub weight: String,
    pub header: String,
    pub header_value: String,
    pub header_pattern: String,
    pub cookie: String,
    pub hosts: Vec<String>,
}

impl CanaryIngress {
    /// Read canary settings from an ingress' annotations.
    ///
    /// Returns `None` for ingresses that are not marked as canaries.
    pub fn from_annotations(
        namespace: &str,
        name: &str,
        annotations: &BTreeMap<String, String>,
        hosts: Vec<String>,
    ) -> Option<Self> {
        if annotations.get(ANNOTATION_CANARY).map(String::as_str) != Some("true") {
            return None;
        }

        let get = |key: &str| annotations.get(key).cloned().unwrap_or_default();
        Some(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            weight: annotations
                .get(ANNOTATION_WEIGHT)
                .cloned()
                .unwrap_or_else(|| "0".to_string()),
            header: get(ANNOTATION_BY_HEADER),
            header_value: get(ANNOTATION_BY_HEADER_VALUE),
            header_pattern: get(ANNOTATION_BY_HEADER_PATTERN),
            cookie: get(ANNOTATION_BY_COOKIE),
            hosts,
        })
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(&self.namespace, &self.name)
    }
}

/// Operator-supplied canary routing settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CanaryRule {
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub header_value: Option<String>,
    #[serde(default)]
    pub header_pattern: Option<String>,
    #[serde(default)]
    pub cookie: Option<String>,
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

impl CanaryRule {
    /// Validate the rule and build the annotations to write.
    ///
    /// The weight is always written. Optional routing keys are written only
    /// when non-blank, and a header value takes precedence over a header
    /// pattern.
    pub fn to_annotations(&self) -> Result<BTreeMap<String, String>, CanaryError> {
        let weight_raw = match trimmed(&self.weight) {
            "" => "0",
            w => w,
        };
        let weight: u32 = weight_raw.parse().map_err(|_| {
            CanaryError::IllegalArgument(format!(
                "canary-weight must be an integer between 0 and {}",
                MAX_WEIGHT
            ))
        })?;
        if weight > MAX_WEIGHT {
            return Err(CanaryError::IllegalArgument(format!(
                "canary-weight must be an integer between 0 and {}",
                MAX_WEIGHT
            )));
        }

        let header = trimmed(&self.header);
        let header_value = trimmed(&self.header_value);
        let header_pattern = if header_value.is_empty() {
            trimmed(&self.header_pattern)
        } else {
            ""
        };
        let cookie = trimmed(&self.cookie);

        if !header_pattern.is_empty() {
            Regex::new(header_pattern).map_err(|e| {
                CanaryError::IllegalArgument(format!(
                    "canary-by-header-pattern is not a valid regular expression: {}",
                    e
                ))
            })?;
        }

        let mut annotations = BTreeMap::new();
        annotations.insert(ANNOTATION_WEIGHT.to_string(), weight.to_string());
        for (key, value) in [
            (ANNOTATION_BY_HEADER, header),
            (ANNOTATION_BY_HEADER_VALUE, header_value),
            (ANNOTATION_BY_HEADER_PATTERN, header_pattern),
            (ANNOTATION_BY_COOKIE, cookie),
        ] {
            if !value.is_empty() {
                annotations.insert(key.to_string(), value.to_string());
            }
        }

        Ok(annotations)
    }
}
