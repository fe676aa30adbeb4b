use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::frame::{Frame, Rotation};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("frame source is not open")]
    NotOpen,
    #[error("no video stream found in {0}")]
    NoVideoStream(PathBuf),
    #[error("decoder error: {0}")]
    Decode(#[from] ffmpeg_next::Error),
}

/// Properties of an opened source.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Zero when the container does not report a frame count.
    pub total_frames: usize,
    pub rotation: Rotation,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

/// Produces timestamped frames.
///
/// No ordering guarantee is assumed from a source; ordering is enforced
/// downstream by the detection worker's timestamp guard.
pub trait FrameSource: Send {
    fn open(&mut self, path: &Path) -> Result<SourceInfo, SourceError>;

    /// Frames in decode order.
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_>;

    fn close(&mut self);
}
