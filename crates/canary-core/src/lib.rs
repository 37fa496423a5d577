//! Canary Core - operational coordination for the canary ingress console
//!
//! This crate provides:
//! - `LockTable`: exclusive, TTL-bounded edit locks keyed by ingress
//! - `DrainController`: Serving → Draining admission lifecycle with in-flight accounting
//! - `Clock`: injectable time source so expiry can be tested without sleeping
//! - Canary ingress model, annotation rules and the `IngressClient` collaborator trait

pub mod clock;
pub mod ingress;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ingress::{CanaryIngress, CanaryRule, IngressClient, ResourceKey};
pub use service::drain::{Admission, DrainController, DrainStatus, InFlightGuard};
pub use service::lock::{AcquireOutcome, LockEntry, LockTable, ReleaseOutcome};
