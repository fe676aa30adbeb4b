use serde::{Deserialize, Serialize};

use crate::shared::face::Face;

/// Engine output for one frame: zero or more faces, stamped with the
/// source frame's timestamp.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub timestamp: f64,
    #[serde(default)]
    pub faces: Vec<Face>,
}

impl DetectionResult {
    pub fn new(timestamp: f64, faces: Vec<Face>) -> Self {
        Self { timestamp, faces }
    }

    pub fn no_face(timestamp: f64) -> Self {
        Self::new(timestamp, Vec::new())
    }

    /// The face metrics are read from. Later faces are ignored.
    pub fn first_face(&self) -> Option<&Face> {
        self.faces.first()
    }

    pub fn has_face(&self) -> bool {
        !self.faces.is_empty()
    }
}
