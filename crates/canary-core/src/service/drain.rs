//! Drain lifecycle management
//!
//! Tracks whether the process is still admitting work (Serving) or retiring
//! (Draining), together with the number of admitted requests that have not
//! completed yet. The transition is one-way: once draining starts it never
//! reverts for the life of the process.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};

/// Outcome of an admission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Counted as in-flight; must be paired with exactly one `complete()`
    Admitted,
    /// Draining; the work must not proceed
    Rejected,
}

/// Point-in-time drain status for health and readiness reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrainStatus {
    pub serving: bool,
    pub draining: bool,
    pub in_flight: u64,
    pub drain_started_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
struct DrainState {
    draining: bool,
    drain_started_at: Option<DateTime<Utc>>,
    reason: Option<String>,
    in_flight: u64,
}

/// Process admission controller.
///
/// `admit`, `complete` and `trigger_drain` each run as one critical section,
/// so no request can be admitted after the drain transition has been observed.
pub struct DrainController {
    state: Mutex<DrainState>,
    idle: Notify,
    clock: Arc<dyn Clock>,
}

impl DrainController {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(DrainState::default()),
            idle: Notify::new(),
            clock,
        }
    }

    /// Admit a unit of work, counting it as in-flight while Serving.
    pub fn admit(&self) -> Admission {
        let mut state = self.state.lock();
        if state.draining {
            return Admission::Rejected;
        }
        state.in_flight += 1;
        Admission::Admitted
    }

    /// Admit a unit of work and tie its completion to the returned guard.
    pub fn enter(self: &Arc<Self>) -> Option<InFlightGuard> {
        match self.admit() {
            Admission::Admitted => Some(InFlightGuard {
                controller: self.clone(),
            }),
            Admission::Rejected => None,
        }
    }

    /// Mark one admitted unit of work as finished.
    ///
    /// The counter is floored at zero.
    pub fn complete(&self) {
        let mut state = self.state.lock();
        if state.in_flight == 0 {
            warn!("complete() called with no admitted requests in flight");
            return;
        }
        state.in_flight -= 1;
        if state.draining && state.in_flight == 0 {
            self.idle.notify_waiters();
        }
    }

    /// Switch to Draining. Only the first call records its reason and timestamp.
    ///
    /// Returns `true` when this call performed the transition.
    pub fn trigger_drain(&self, reason: impl Into<String>) -> bool {
        let mut state = self.state.lock();
        if state.draining {
            return false;
        }

        let reason = reason.into();
        let started_at = self.clock.now();
        state.draining = true;
        state.drain_started_at = Some(started_at);
        state.reason = Some(reason.clone());
        let in_flight = state.in_flight;
        if in_flight == 0 {
            self.idle.notify_waiters();
        }
        drop(state);

        info!(
            reason = %reason,
            in_flight = in_flight,
            started_at = %started_at,
            "Drain started, rejecting new requests"
        );
        true
    }

    pub fn is_draining(&self) -> bool {
        self.state.lock().draining
    }

    pub fn in_flight(&self) -> u64 {
        self.state.lock().in_flight
    }

    pub fn status(&self) -> DrainStatus {
        let state = self.state.lock();
        DrainStatus {
            serving: !state.draining,
            draining: state.draining,
            in_flight: state.in_flight,
            drain_started_at: state.drain_started_at,
            reason: state.reason.clone(),
        }
    }

    /// Resolve once draining has started and no admitted work remains.
    ///
    /// Callers bound this with their own timeout.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a notification between the check
            // and the await is not lost.
            notified.as_mut().enable();
            {
                let state = self.state.lock();
                if state.draining && state.in_flight == 0 {
                    return;
                }
            }
            notified.await;
        }
    }
}

impl Default for DrainController {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl fmt::Debug for DrainController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrainController")
            .field("status", &self.status())
            .finish()
    }
}

/// In-flight admission that completes exactly once when dropped.
#[must_use = "dropping the guard immediately completes the admission"]
pub struct InFlightGuard {
    controller: Arc<DrainController>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.controller.complete();
    }
}

impl fmt::Debug for InFlightGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlightGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_initial_status_is_serving() {
        let controller = DrainController::default();
        let status = controller.status();
        assert!(status.serving);
        assert!(!status.draining);
        assert_eq!(status.in_flight, 0);
        assert!(status.drain_started_at.is_none());
        assert!(status.reason.is_none());
    }

    #[test]
    fn test_admit_and_complete() {
        let controller = DrainController::default();
        assert_eq!(controller.admit(), Admission::Admitted);
        assert_eq!(controller.admit(), Admission::Admitted);
        assert_eq!(controller.in_flight(), 2);

        controller.complete();
        controller.complete();
        assert_eq!(controller.in_flight(), 0);
    }

    #[test]
    fn test_complete_is_floored_at_zero() {
        let controller = DrainController::default();
        controller.complete();
        assert_eq!(controller.in_flight(), 0);

        controller.admit();
        controller.complete();
        controller.complete();
        assert_eq!(controller.in_flight(), 0);
    }

    #[test]
    fn test_drain_rejects_new_work() {
        let controller = DrainController::default();
        assert!(controller.trigger_drain("test"));
        assert_eq!(controller.admit(), Admission::Rejected);
        assert_eq!(controller.in_flight(), 0);
    }

    #[test]
    fn test_drain_is_one_shot() {
        let clock = ManualClock::default();
        let controller = DrainController::new(Arc::new(clock.clone()));

        assert!(controller.trigger_drain("x"));
        let first = controller.status();

        clock.advance(chrono::TimeDelta::seconds(5));
        assert!(!controller.trigger_drain("y"));

        let second = controller.status();
        assert_eq!(second.reason.as_deref(), Some("x"));
        assert_eq!(second.drain_started_at, first.drain_started_at);
        assert!(second.draining);
        assert!(!second.serving);
    }

    #[test]
    fn test_guard_completes_on_drop() {
        let controller = Arc::new(DrainController::default());
        {
            let _guard = controller.enter().unwrap();
            assert_eq!(controller.in_flight(), 1);
        }
        assert_eq!(controller.in_flight(), 0);
    }

    #[test]
    fn test_guard_not_issued_while_draining() {
        let controller = Arc::new(DrainController::default());
        controller.trigger_drain("shutdown");
        assert!(controller.enter().is_none());
        assert_eq!(controller.in_flight(), 0);
    }

    #[test]
    fn test_guard_completes_on_panic() {
        let controller = Arc::new(DrainController::default());
        let inner = controller.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = inner.enter().unwrap();
            panic!("handler failed");
        }));
        assert!(result.is_err());
        assert_eq!(controller.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_resolves_after_last_completion() {
        let controller = Arc::new(DrainController::default());
        let guard = controller.enter().unwrap();
        controller.trigger_drain("signal:15");

        let waiter = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.wait_idle().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_idle should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_idle_immediate_when_already_idle() {
        let controller = DrainController::default();
        controller.trigger_drain("manual");
        tokio::time::timeout(Duration::from_millis(100), controller.wait_idle())
            .await
            .expect("already idle");
    }

    #[tokio::test]
    async fn test_wait_idle_pending_while_serving() {
        let controller = DrainController::default();
        let result =
            tokio::time::timeout(Duration::from_millis(50), controller.wait_idle()).await;
        assert!(result.is_err());
    }
}
