use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use facemetrics_core::metrics::domain::metric_tag::{MetricKind, MetricTag};
use facemetrics_core::shared::constants::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_TRIGGER_METRIC, DEFAULT_TRIGGER_SUSTAIN,
    DEFAULT_TRIGGER_THRESHOLD, DEFAULT_WEBHOOK_EVENT, TIMESTAMP_EPSILON,
};

/// Persistent user settings. Missing fields take their defaults, so older
/// files keep loading as fields are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub epsilon: f64,
    pub trigger_metric: String,
    pub threshold: f32,
    pub sustain_count: usize,
    /// Full webhook URL. Takes precedence over `webhook_key`.
    pub webhook_url: Option<String>,
    pub webhook_event: String,
    /// IFTTT maker key.
    pub webhook_key: Option<String>,
    pub queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            epsilon: TIMESTAMP_EPSILON,
            trigger_metric: DEFAULT_TRIGGER_METRIC.to_string(),
            threshold: DEFAULT_TRIGGER_THRESHOLD,
            sustain_count: DEFAULT_TRIGGER_SUSTAIN,
            webhook_url: None,
            webhook_event: DEFAULT_WEBHOOK_EVENT.to_string(),
            webhook_key: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceMetrics").join("settings.json"))
    }

    /// Loads from the user config directory, or defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads from `path`. A missing or malformed file yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring malformed settings {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Resolves the trigger metric, which must name a numeric catalog entry.
    pub fn trigger_tag(&self) -> Result<MetricTag, String> {
        let tag = MetricTag::from_name(&self.trigger_metric)
            .ok_or_else(|| format!("Unknown trigger metric '{}'", self.trigger_metric))?;
        if tag.kind() != MetricKind::Numeric {
            return Err(format!(
                "Trigger metric must be numeric, '{}' is categorical",
                tag.name()
            ));
        }
        Ok(tag)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(format!(
                "Epsilon must be a non-negative number of seconds, got {}",
                self.epsilon
            ));
        }
        if !self.threshold.is_finite() {
            return Err(format!("Threshold must be finite, got {}", self.threshold));
        }
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be at least 1".into());
        }
        self.trigger_tag()?;
        Ok(())
    }
}
