use crate::metrics::domain::metric_tag::MetricTag;
use crate::metrics::domain::metric_value::MetricValue;

/// Receives named metric values for each processed frame.
pub trait MetricsSink: Send {
    fn set_value(&mut self, tag: MetricTag, value: &MetricValue);

    /// No face in the frame: every metric is not applicable.
    fn mark_all_not_applicable(&mut self);

    /// Called once all values of the frame at `timestamp` were delivered.
    fn end_frame(&mut self, _timestamp: f64) {}
}
