use thiserror::Error;

use crate::shared::detection_result::DetectionResult;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    #[error("detection failed: {0}")]
    Detection(String),
}

/// Domain interface for the facial-metrics detection engine.
///
/// The engine is synchronous and stateful, hence `&mut self`. The pipeline
/// guarantees `detect` is never called concurrently on one instance and only
/// between a successful `open` and the matching `close`.
pub trait Engine: Send {
    fn open(&mut self) -> Result<(), EngineError>;

    /// Runs detection on one frame. The returned result carries the frame's
    /// timestamp.
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, EngineError>;

    fn close(&mut self);
}
