use std::time::Instant;

/// Assigns live capture timestamps: seconds elapsed since the first frame.
///
/// The first stamped frame gets 0.0.
#[derive(Debug, Default)]
pub struct FrameClock {
    first_frame: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stamp(&mut self) -> f64 {
        self.stamp_at(Instant::now())
    }

    pub fn stamp_at(&mut self, now: Instant) -> f64 {
        match self.first_frame {
            None => {
                self.first_frame = Some(now);
                0.0
            }
            Some(first) => now.saturating_duration_since(first).as_secs_f64(),
        }
    }

    /// Forgets the reference instant; the next frame restarts at 0.0.
    pub fn reset(&mut self) {
        self.first_frame = None;
    }
}
