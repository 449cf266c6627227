//! Contract failure metrics.
//!
//! Counters are emitted through the `metrics` facade; the host installs
//! whatever recorder it exports with. Without one they are no-ops.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `kanon_request_validation_failures_total` | Counter | `operation`, `location` | Requests rejected by their contract |
//! | `kanon_response_validation_failures_total` | Counter | `operation` | Handler values that broke their contract |

use metrics::{counter, describe_counter};

/// Name of the request failure counter.
pub const REQUEST_VALIDATION_FAILURES: &str = "kanon_request_validation_failures_total";

/// Name of the response failure counter.
pub const RESPONSE_VALIDATION_FAILURES: &str = "kanon_response_validation_failures_total";

/// Registers descriptions for the Kanon counters with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        REQUEST_VALIDATION_FAILURES,
        "Requests rejected by their operation contract"
    );
    describe_counter!(
        RESPONSE_VALIDATION_FAILURES,
        "Responses that failed their operation contract"
    );
}

/// Records a rejected request.
pub fn record_request_failure(operation: &str, location: &str) {
    counter!(
        REQUEST_VALIDATION_FAILURES,
        "operation" => operation.to_string(),
        "location" => location.to_string()
    )
    .increment(1);
}

/// Records a response that failed its contract.
pub fn record_response_failure(operation: &str) {
    counter!(
        RESPONSE_VALIDATION_FAILURES,
        "operation" => operation.to_string()
    )
    .increment(1);
}
