//! Microsoft Graph request metrics.
//!
//! Provides functions for recording Graph request counts and timings.

use metrics::{counter, histogram};
use std::time::Instant;

/// Record Graph request duration.
pub fn record_request_duration(operation: &str, duration_secs: f64) {
    histogram!(
        "graph_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// Record one `$batch` dispatch and the number of sub-requests it carried.
pub fn record_batch_dispatch(sub_requests: usize) {
    counter!("graph_batch_dispatches_total").increment(1);
    counter!("graph_batch_subrequests_total").increment(sub_requests as u64);
}

/// A helper to time Graph operations and record metrics.
///
/// Usage:
/// ```ignore
/// let timer = RequestTimer::new("batch");
/// let result = client.post(url).json(&body).send().await;
/// timer.record();
/// result
/// ```
pub struct RequestTimer {
    operation: String,
    start: Instant,
}

impl RequestTimer {
    /// Create a new timer for the given operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_request_duration(&self.operation, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timer_creation() {
        let timer = RequestTimer::new("batch");
        assert_eq!(timer.operation, "batch");
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        RequestTimer::new(String::from("get_user")).record();
        record_batch_dispatch(5);
    }
}
