//! Metrics sink emitting counters as tracing events.

use gatherline_application::ports::metrics::MetricsSink;
use tracing::debug;

/// Sink that forwards every observation to the tracing subscriber.
///
/// Each orchestrator instance gets its own sink; aggregation across
/// sessions happens wherever the logs are shipped.
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn incr(&self, counter: &str, value: u64) {
        debug!(counter, value, "metric");
    }

    fn observe(&self, gauge: &str, value: f64) {
        debug!(gauge, value, "metric");
    }
}
