use crate::metrics::domain::metric_tag::MetricTag;
use crate::triggers::domain::event_notifier::EventNotifier;

/// Notifier that only logs the event. Used when no webhook is configured.
pub struct LogNotifier {
    metric: MetricTag,
}

impl LogNotifier {
    pub fn new(metric: MetricTag) -> Self {
        Self { metric }
    }
}

impl EventNotifier for LogNotifier {
    fn notify(&self, value: f32) {
        log::info!("Event: sustained {} at {value:.2}", self.metric);
    }
}
