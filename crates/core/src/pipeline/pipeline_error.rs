use thiserror::Error;

use crate::detection::domain::engine::EngineError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("detection engine unavailable: {0}")]
    EngineUnavailable(#[source] EngineError),
    #[error("detection worker is already running")]
    AlreadyRunning,
    #[error("detection worker is not running")]
    NotRunning,
    #[error("result at {current}s dispatched after result at {previous}s")]
    OrderingViolation { previous: f64, current: f64 },
    #[error("detection worker thread panicked")]
    WorkerPanicked,
}
