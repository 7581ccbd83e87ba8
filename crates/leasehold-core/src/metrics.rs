// Metrics for lock manager observability
// Renewal failures are swallowed on the lease path, so the counter here is
// the only signal that a lease may expire under a live holder

use metrics::{counter, describe_counter, describe_gauge, gauge};

use leasehold_store::LockKey;

/// Initialize all metric descriptions
/// Should be called once at application startup
pub fn init_metrics() {
    describe_counter!(
        "lock_acquire_total",
        "Total number of successful lease acquisitions"
    );
    describe_counter!(
        "lock_acquire_failures_total",
        "Total number of lease acquisitions that timed out or lost the race"
    );
    describe_counter!(
        "lock_renewal_failures_total",
        "Total number of lease renewals rejected by the store or failed in transit"
    );
    describe_gauge!(
        "lock_held_leases",
        "Number of leases currently registered with the manager"
    );
}

pub(crate) fn record_acquire() {
    counter!("lock_acquire_total").increment(1);
}

pub(crate) fn record_acquire_failure() {
    counter!("lock_acquire_failures_total").increment(1);
}

pub(crate) fn record_renewal_failure(key: &LockKey) {
    counter!("lock_renewal_failures_total", "key" => key.to_string()).increment(1);
}

pub(crate) fn set_held_leases(count: usize) {
    gauge!("lock_held_leases").set(count as f64);
}
