use crate::metrics::domain::metric_extractor::MetricExtractor;
use crate::metrics::domain::metrics_sink::MetricsSink;
use crate::pipeline::detection_listener::DetectionEvent;
use crate::rendering::domain::drawing_sink::DrawingSink;
use crate::triggers::domain::event_trigger::EventTrigger;

/// Applies detection results to the display sinks and the event trigger.
///
/// Runs on the consumer's thread, one event at a time in the order the
/// worker produced them.
pub struct MetricsPresenter {
    extractor: MetricExtractor,
    metrics: Box<dyn MetricsSink>,
    drawing: Option<Box<dyn DrawingSink>>,
    trigger: Option<EventTrigger>,
    presented: usize,
}

impl MetricsPresenter {
    pub fn new(extractor: MetricExtractor, metrics: Box<dyn MetricsSink>) -> Self {
        Self {
            extractor,
            metrics,
            drawing: None,
            trigger: None,
            presented: 0,
        }
    }

    pub fn with_drawing(mut self, drawing: Box<dyn DrawingSink>) -> Self {
        self.drawing = Some(drawing);
        self
    }

    pub fn with_trigger(mut self, trigger: EventTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    pub fn present(&mut self, event: &DetectionEvent) {
        let result = &event.result;
        let face = result.first_face();

        if face.is_some() {
            for (tag, value) in self.extractor.extract_all(result) {
                self.metrics.set_value(tag, &value);
            }
        } else {
            self.metrics.mark_all_not_applicable();
        }
        self.metrics.end_frame(result.timestamp);

        if let Some(drawing) = self.drawing.as_mut() {
            drawing.draw(&event.frame, face.map(|f| f.points.as_slice()));
        }

        if let Some(trigger) = self.trigger.as_mut() {
            match self.extractor.extract(trigger.metric(), result).as_score() {
                Some(score) => {
                    trigger.observe(score);
                }
                None => trigger.clear(),
            }
        }

        self.presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::domain::metric_tag::MetricTag;
    use crate::metrics::domain::metric_value::MetricValue;
    use crate::shared::detection_result::DetectionResult;
    use crate::shared::face::Face;
    use crate::shared::frame::{ColorFormat, Frame, Rotation};
    use crate::triggers::domain::event_notifier::EventNotifier;
    use crate::triggers::domain::event_trigger::TriggerConfig;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, PartialEq)]
    enum SinkCall {
        Set(MetricTag, MetricValue),
        NotApplicable,
        End(f64),
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        calls: Arc<Mutex<Vec<SinkCall>>>,
    }

    impl MetricsSink for RecordingSink {
        fn set_value(&mut self, tag: MetricTag, value: &MetricValue) {
            self.calls.lock().unwrap().push(SinkCall::Set(tag, value.clone()));
        }
        fn mark_all_not_applicable(&mut self) {
            self.calls.lock().unwrap().push(SinkCall::NotApplicable);
        }
        fn end_frame(&mut self, timestamp: f64) {
            self.calls.lock().unwrap().push(SinkCall::End(timestamp));
        }
    }

    #[derive(Clone, Default)]
    struct RecordingDrawing {
        draws: Arc<Mutex<Vec<(f64, Option<Vec<(f32, f32)>>)>>>,
    }

    impl DrawingSink for RecordingDrawing {
        fn draw(&mut self, frame: &Frame, points: Option<&[(f32, f32)]>) {
            self.draws
                .lock()
                .unwrap()
                .push((frame.timestamp(), points.map(|p| p.to_vec())));
        }
    }

    #[derive(Clone, Default)]
    struct CountingNotifier {
        count: Arc<Mutex<usize>>,
    }

    impl EventNotifier for CountingNotifier {
        fn notify(&self, _value: f32) {
            *self.count.lock().unwrap() += 1;
        }
    }

    fn event(timestamp: f64, smile: Option<f32>) -> DetectionEvent {
        let faces = smile
            .map(|s| {
                let mut face = Face::default();
                face.expressions.smile = s;
                face.points = vec![(1.0, 1.0)];
                vec![face]
            })
            .unwrap_or_default();
        DetectionEvent {
            frame: Frame::new(vec![0u8; 4], 2, 2, ColorFormat::Gray8, Rotation::None, timestamp),
            result: DetectionResult::new(timestamp, faces),
        }
    }

    fn presenter(sink: &RecordingSink) -> MetricsPresenter {
        MetricsPresenter::new(MetricExtractor::new().unwrap(), Box::new(sink.clone()))
    }

    #[test]
    fn test_face_sets_every_metric_then_ends_frame() {
        let sink = RecordingSink::default();
        let mut presenter = presenter(&sink);

        presenter.present(&event(0.5, Some(42.0)));

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), MetricTag::ALL.len() + 1);
        assert!(calls.contains(&SinkCall::Set(MetricTag::Smile, MetricValue::Score(42.0))));
        assert_eq!(calls.last(), Some(&SinkCall::End(0.5)));
    }

    #[test]
    fn test_no_face_marks_all_not_applicable() {
        let sink = RecordingSink::default();
        let mut presenter = presenter(&sink);

        presenter.present(&event(0.5, None));

        assert_eq!(
            *sink.calls.lock().unwrap(),
            vec![SinkCall::NotApplicable, SinkCall::End(0.5)]
        );
    }

    #[test]
    fn test_drawing_receives_points_only_with_face() {
        let sink = RecordingSink::default();
        let drawing = RecordingDrawing::default();
        let mut presenter = presenter(&sink).with_drawing(Box::new(drawing.clone()));

        presenter.present(&event(0.0, Some(10.0)));
        presenter.present(&event(0.1, None));

        assert_eq!(
            *drawing.draws.lock().unwrap(),
            vec![(0.0, Some(vec![(1.0, 1.0)])), (0.1, None)]
        );
        assert_eq!(presenter.presented(), 2);
    }

    #[test]
    fn test_trigger_fires_once_and_no_face_rearms() {
        let sink = RecordingSink::default();
        let notifier = CountingNotifier::default();
        let config = TriggerConfig {
            metric: MetricTag::Smile,
            threshold: 80.0,
            sustain_count: 2,
        };
        let trigger = EventTrigger::new(config, Box::new(notifier.clone()));
        let mut presenter = presenter(&sink).with_trigger(trigger);

        let mut ts = 0.0;
        let mut feed = |presenter: &mut MetricsPresenter, smile: Option<f32>| {
            presenter.present(&event(ts, smile));
            ts += 0.1;
        };
        for _ in 0..5 {
            feed(&mut presenter, Some(95.0));
        }
        assert_eq!(*notifier.count.lock().unwrap(), 1);

        feed(&mut presenter, None);
        for _ in 0..3 {
            feed(&mut presenter, Some(95.0));
        }
        assert_eq!(*notifier.count.lock().unwrap(), 2);
    }
}
