use crate::shared::constants::TIMESTAMP_EPSILON;

/// Admits only frames whose timestamps strictly increase by more than
/// `epsilon` over the last admitted frame.
///
/// Rejects duplicates and out-of-order frames, and throttles submission to
/// at most one frame per `epsilon` seconds regardless of producer rate.
#[derive(Clone, Debug)]
pub struct TimestampGuard {
    epsilon: f64,
    last_accepted: Option<f64>,
}

impl TimestampGuard {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            last_accepted: None,
        }
    }

    /// Returns `true` and records `timestamp` if the frame is admitted.
    pub fn admit(&mut self, timestamp: f64) -> bool {
        if !timestamp.is_finite() {
            return false;
        }
        let admitted = match self.last_accepted {
            None => true,
            Some(last) => timestamp > last + self.epsilon,
        };
        if admitted {
            self.last_accepted = Some(timestamp);
        }
        admitted
    }

    /// Forgets the last admitted timestamp, e.g. after a camera switch.
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }

    pub fn last_accepted(&self) -> Option<f64> {
        self.last_accepted
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl Default for TimestampGuard {
    fn default() -> Self {
        Self::new(TIMESTAMP_EPSILON)
    }
}
