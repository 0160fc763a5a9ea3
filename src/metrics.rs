use tracing::trace;

// Trace-based counters; the Prometheus recorder only backs /metrics.

pub fn inc_requests(route: &'static str) {
    trace!(
        target = "storefront.metrics",
        route = route,
        "requests_total_inc"
    );
}

pub fn submission_finished(outcome: &'static str, elapsed_ms: u128) {
    trace!(
        target = "storefront.metrics",
        outcome = outcome,
        elapsed_ms = elapsed_ms as u64,
        "submission_elapsed"
    );
}
