use crate::metrics::domain::metric_tag::MetricTag;
use crate::shared::constants::{
    DEFAULT_TRIGGER_METRIC, DEFAULT_TRIGGER_SUSTAIN, DEFAULT_TRIGGER_THRESHOLD,
};
use crate::triggers::domain::event_notifier::EventNotifier;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerConfig {
    pub metric: MetricTag,
    /// Scores strictly above this are active.
    pub threshold: f32,
    /// Active samples that must be exceeded before firing.
    pub sustain_count: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            metric: MetricTag::from_name(DEFAULT_TRIGGER_METRIC).unwrap_or(MetricTag::Smile),
            threshold: DEFAULT_TRIGGER_THRESHOLD,
            sustain_count: DEFAULT_TRIGGER_SUSTAIN,
        }
    }
}

/// Hysteresis over one metric stream: fires the notifier once per sustained
/// excursion above the threshold and re-arms only when the score falls back
/// to or below it.
pub struct EventTrigger {
    config: TriggerConfig,
    notifier: Box<dyn EventNotifier>,
    consecutive_active: usize,
    fired: bool,
}

impl EventTrigger {
    pub fn new(config: TriggerConfig, notifier: Box<dyn EventNotifier>) -> Self {
        Self {
            config,
            notifier,
            consecutive_active: 0,
            fired: false,
        }
    }

    pub fn metric(&self) -> MetricTag {
        self.config.metric
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Feeds one score. Returns `true` if the notifier fired on this sample.
    pub fn observe(&mut self, score: f32) -> bool {
        if score.is_nan() || score <= self.config.threshold {
            self.clear();
            return false;
        }

        self.consecutive_active = self.consecutive_active.saturating_add(1);
        if self.consecutive_active > self.config.sustain_count && !self.fired {
            self.fired = true;
            log::info!(
                "{} above {} for {} frames, notifying",
                self.config.metric,
                self.config.threshold,
                self.consecutive_active
            );
            self.notifier.notify(score);
            return true;
        }
        false
    }

    /// Re-arms the trigger, e.g. when no face is in view.
    pub fn clear(&mut self) {
        self.consecutive_active = 0;
        self.fired = false;
    }

    pub fn consecutive_active(&self) -> usize {
        self.consecutive_active
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CountingNotifier {
        values: Arc<Mutex<Vec<f32>>>,
    }

    impl CountingNotifier {
        fn count(&self) -> usize {
            self.values.lock().unwrap().len()
        }
    }

    impl EventNotifier for CountingNotifier {
        fn notify(&self, value: f32) {
            self.values.lock().unwrap().push(value);
        }
    }

    fn trigger(threshold: f32, sustain_count: usize) -> (EventTrigger, CountingNotifier) {
        let notifier = CountingNotifier::default();
        let config = TriggerConfig {
            metric: MetricTag::Smile,
            threshold,
            sustain_count,
        };
        (EventTrigger::new(config, Box::new(notifier.clone())), notifier)
    }

    fn feed(trigger: &mut EventTrigger, scores: &[f32]) -> usize {
        scores.iter().filter(|&&s| trigger.observe(s)).count()
    }

    #[test]
    fn test_two_excursions_notify_twice() {
        let (mut trigger, notifier) = trigger(80.0, 10);
        let mut scores = vec![90.0; 11];
        scores.push(70.0);
        scores.extend(vec![90.0; 11]);

        assert_eq!(feed(&mut trigger, &scores), 2);
        assert_eq!(notifier.count(), 2);
    }

    #[test]
    fn test_fires_on_the_sample_exceeding_sustain_count() {
        let (mut trigger, notifier) = trigger(80.0, 10);
        assert_eq!(feed(&mut trigger, &[90.0; 10]), 0);
        assert!(trigger.observe(95.0));
        assert_eq!(*notifier.values.lock().unwrap(), vec![95.0]);
    }

    #[test]
    fn test_long_excursion_fires_once() {
        let (mut trigger, notifier) = trigger(80.0, 10);
        feed(&mut trigger, &[99.0; 500]);
        assert_eq!(notifier.count(), 1);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let (mut trigger, notifier) = trigger(80.0, 2);
        feed(&mut trigger, &[80.0; 20]);
        assert_eq!(notifier.count(), 0);
        assert_eq!(trigger.consecutive_active(), 0);
    }

    #[test]
    fn test_dip_resets_count() {
        let (mut trigger, notifier) = trigger(80.0, 10);
        feed(&mut trigger, &[90.0; 10]);
        trigger.observe(50.0);
        feed(&mut trigger, &[90.0; 10]);
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_nan_counts_as_inactive() {
        let (mut trigger, notifier) = trigger(80.0, 1);
        trigger.observe(90.0);
        trigger.observe(f32::NAN);
        trigger.observe(90.0);
        assert_eq!(notifier.count(), 0);
        assert!(trigger.observe(90.0));
    }

    #[test]
    fn test_clear_rearms() {
        let (mut trigger, notifier) = trigger(80.0, 0);
        assert!(trigger.observe(90.0));
        assert!(trigger.has_fired());
        trigger.clear();
        assert!(!trigger.has_fired());
        assert!(trigger.observe(90.0));
        assert_eq!(notifier.count(), 2);
    }

    #[test]
    fn test_default_config() {
        let config = TriggerConfig::default();
        assert_eq!(config.metric, MetricTag::Smile);
        assert_eq!(config.threshold, 80.0);
        assert_eq!(config.sustain_count, 10);
    }
}
