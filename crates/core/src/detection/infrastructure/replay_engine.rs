use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::domain::engine::{Engine, EngineError};
use crate::shared::constants::REPLAY_TOLERANCE;
use crate::shared::detection_result::DetectionResult;
use crate::shared::face::Face;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read recording {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse recording {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

enum Recording {
    File(PathBuf),
    Loaded(Vec<DetectionResult>),
}

/// Replays previously recorded detection results by frame timestamp.
///
/// A recording is a JSON array of `{"timestamp": .., "faces": [..]}`
/// objects. Each frame receives the faces of the recorded entry closest to
/// its timestamp, provided it lies within the tolerance; otherwise the frame
/// is reported as having no face.
pub struct ReplayEngine {
    recording: Recording,
    entries: Vec<DetectionResult>,
    tolerance: f64,
    open: bool,
}

impl ReplayEngine {
    /// Engine that loads its recording from `path` when opened.
    pub fn from_file(path: &Path) -> Self {
        Self {
            recording: Recording::File(path.to_path_buf()),
            entries: Vec::new(),
            tolerance: REPLAY_TOLERANCE,
            open: false,
        }
    }

    /// Engine over an in-memory recording.
    pub fn from_results(results: Vec<DetectionResult>) -> Self {
        Self {
            recording: Recording::Loaded(results),
            entries: Vec::new(),
            tolerance: REPLAY_TOLERANCE,
            open: false,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn load(path: &Path) -> Result<Vec<DetectionResult>, ReplayError> {
        let json = fs::read_to_string(path).map_err(|e| ReplayError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ReplayError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn lookup(&self, timestamp: f64) -> Option<&[Face]> {
        let idx = self.entries.partition_point(|r| r.timestamp < timestamp);
        let before = idx.checked_sub(1).and_then(|i| self.entries.get(i));
        let after = self.entries.get(idx);

        let nearest = match (before, after) {
            (Some(b), Some(a)) => {
                if timestamp - b.timestamp <= a.timestamp - timestamp {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };

        if (nearest.timestamp - timestamp).abs() <= self.tolerance {
            Some(&nearest.faces)
        } else {
            None
        }
    }
}

impl Engine for ReplayEngine {
    fn open(&mut self) -> Result<(), EngineError> {
        let mut entries = match &self.recording {
            Recording::File(path) => {
                Self::load(path).map_err(|e| EngineError::Unavailable(e.to_string()))?
            }
            Recording::Loaded(results) => results.clone(),
        };
        entries.retain(|r| r.timestamp.is_finite());
        entries.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        log::debug!("Replay engine loaded {} recorded results", entries.len());
        self.entries = entries;
        self.open = true;
        Ok(())
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, EngineError> {
        if !self.open {
            return Err(EngineError::Detection("replay engine is not open".into()));
        }
        let faces = self
            .lookup(frame.timestamp())
            .map(|faces| faces.to_vec())
            .unwrap_or_default();
        Ok(DetectionResult::new(frame.timestamp(), faces))
    }

    fn close(&mut self) {
        self.entries.clear();
        self.open = false;
    }
}
