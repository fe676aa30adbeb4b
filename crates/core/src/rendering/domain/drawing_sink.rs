use crate::shared::frame::Frame;

/// Renders a processed frame, optionally with facial landmark points.
pub trait DrawingSink: Send {
    /// `points` is `None` when no face was found in the frame.
    fn draw(&mut self, frame: &Frame, points: Option<&[(f32, f32)]>);
}
