//! Canary ingress console server
//!
//! HTTP surface over the coordination core: per-ingress edit locks, canary
//! annotation editing through the Kubernetes API, and readiness-aware
//! graceful drain.

pub mod api;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod model;
pub mod service;
pub mod startup;
