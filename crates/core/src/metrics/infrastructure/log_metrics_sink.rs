use crate::metrics::domain::metric_tag::MetricTag;
use crate::metrics::domain::metric_value::MetricValue;
use crate::metrics::domain::metrics_sink::MetricsSink;

/// Logs one line per frame with every applicable metric.
#[derive(Default)]
pub struct LogMetricsSink {
    line: Vec<String>,
    no_face: bool,
}

impl LogMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_line(&mut self, timestamp: f64) -> String {
        let line = if self.no_face {
            format!("{timestamp:8.3}s  no face")
        } else {
            format!("{timestamp:8.3}s  {}", self.line.join("  "))
        };
        self.line.clear();
        self.no_face = false;
        line
    }
}

impl MetricsSink for LogMetricsSink {
    fn set_value(&mut self, tag: MetricTag, value: &MetricValue) {
        if value.is_applicable() {
            self.line.push(format!("{tag}={value}"));
        }
    }

    fn mark_all_not_applicable(&mut self) {
        self.line.clear();
        self.no_face = true;
    }

    fn end_frame(&mut self, timestamp: f64) {
        let line = self.take_line(timestamp);
        log::info!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_lists_applicable_values() {
        let mut sink = LogMetricsSink::new();
        sink.set_value(MetricTag::Smile, &MetricValue::Score(91.0));
        sink.set_value(MetricTag::Gender, &MetricValue::Label("male"));
        sink.set_value(MetricTag::Joy, &MetricValue::NotApplicable);

        let line = sink.take_line(1.5);
        assert!(line.contains("smile=91.00"));
        assert!(line.contains("gender=male"));
        assert!(!line.contains("joy"));
    }

    #[test]
    fn test_no_face_line() {
        let mut sink = LogMetricsSink::new();
        sink.set_value(MetricTag::Smile, &MetricValue::Score(91.0));
        sink.mark_all_not_applicable();

        assert!(sink.take_line(0.0).ends_with("no face"));
        assert!(!sink.take_line(0.1).contains("no face"));
    }
}
