// Metrics for lock coordination, drain admission and cluster calls
// Recorded through the `metrics` facade; no exporter is installed here

use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Initialize all metric descriptions
/// Should be called once at application startup
pub fn init_metrics() {
    // Lock metrics
    describe_counter!(
        "lock_acquire_total",
        "Total number of lock acquisition attempts by outcome"
    );
    describe_counter!(
        "lock_release_total",
        "Total number of lock release attempts by outcome"
    );
    describe_gauge!("locks_held", "Current number of live ingress locks");

    // Drain metrics
    describe_gauge!("http_in_flight", "Admitted requests that have not completed");
    describe_counter!(
        "http_requests_rejected_total",
        "Total number of requests rejected while draining"
    );

    // Kubernetes metrics
    describe_histogram!(
        "kube_request_duration_seconds",
        "Kubernetes API call duration in seconds"
    );
    describe_counter!(
        "kube_request_errors_total",
        "Total number of failed Kubernetes API calls"
    );

    tracing::info!("Metrics initialized");
}

/// Record a lock acquisition attempt
pub fn record_lock_acquire(granted: bool) {
    let outcome = if granted { "granted" } else { "denied" };
    counter!("lock_acquire_total", "outcome" => outcome).increment(1);
}

/// Record a lock release attempt
pub fn record_lock_release(released: bool) {
    let outcome = if released { "released" } else { "noop" };
    counter!("lock_release_total", "outcome" => outcome).increment(1);
}

/// Update the live lock count
pub fn set_locks_held(count: usize) {
    gauge!("locks_held").set(count as f64);
}

/// Update the in-flight request count
pub fn set_in_flight(count: u64) {
    gauge!("http_in_flight").set(count as f64);
}

/// Record a request turned away while draining
pub fn record_request_rejected() {
    counter!("http_requests_rejected_total").increment(1);
}

/// Record a Kubernetes API call
pub fn record_kube_request(operation: &'static str, duration_secs: f64, success: bool) {
    histogram!("kube_request_duration_seconds", "operation" => operation).record(duration_secs);

    if !success {
        counter!("kube_request_errors_total", "operation" => operation).increment(1);
    }
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer() {
        let timer = Timer::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.elapsed_secs() >= 0.01);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        init_metrics();
        record_lock_acquire(true);
        record_lock_release(false);
        set_locks_held(1);
        set_in_flight(0);
        record_request_rejected();
        record_kube_request("list", 0.01, false);
    }
}
