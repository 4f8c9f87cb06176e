//! Metrics sink port.
//!
//! Counters are session-scoped: every orchestrator instance gets its own
//! injected sink and aggregation across instances happens outside the
//! process.

/// Sink for operational counters and gauges.
pub trait MetricsSink: Send + Sync {
    /// Increment a named counter.
    fn incr(&self, counter: &str, value: u64);

    /// Record a gauge observation.
    fn observe(&self, gauge: &str, value: f64);
}

/// No-op metrics sink.
pub struct NoMetrics;

impl MetricsSink for NoMetrics {
    fn incr(&self, _counter: &str, _value: u64) {}
    fn observe(&self, _gauge: &str, _value: f64) {}
}
