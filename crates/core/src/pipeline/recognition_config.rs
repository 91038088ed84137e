use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::infrastructure::two_stage_detector::DetectionParams;
use crate::recognition::infrastructure::landmark_recognizer::DEFAULT_SIMILARITY_THRESHOLD;
use crate::shared::constants::{DEFAULT_CHANNEL_CAPACITY, DELETE_SETTLE_MS, OVERLAY_FRAME_COUNT};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Startup options for the recognition pipeline.
///
/// Fields missing from a config file take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Without a frame sink, hand frames back to the source instead of
    /// releasing them.
    pub return_frames: bool,
    pub channel_capacity: usize,
    /// Frame buffers the source may have in flight when frames are returned.
    pub frame_buffers: usize,
    pub overlay_frames: usize,
    pub delete_settle_ms: u64,
    pub detection: DetectionParams,
    pub similarity_threshold: f64,
    pub enrollment_path: Option<PathBuf>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            return_frames: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            frame_buffers: DEFAULT_CHANNEL_CAPACITY,
            overlay_frames: OVERLAY_FRAME_COUNT,
            delete_settle_ms: DELETE_SETTLE_MS,
            detection: DetectionParams::default(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            enrollment_path: None,
        }
    }
}

impl RecognitionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel_capacity must be at least 1".into(),
            ));
        }
        if self.frame_buffers == 0 {
            return Err(ConfigError::Invalid("frame_buffers must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::Invalid(format!(
                "similarity_threshold must be between 0.0 and 1.0, got {}",
                self.similarity_threshold
            )));
        }
        for (stage, params) in [
            ("coarse", &self.detection.coarse),
            ("refine", &self.detection.refine),
        ] {
            if params.top_k == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{stage} top_k must be at least 1"
                )));
            }
            if !(0.0..=1.0).contains(&params.nms_threshold) {
                return Err(ConfigError::Invalid(format!(
                    "{stage} nms_threshold must be between 0.0 and 1.0, got {}",
                    params.nms_threshold
                )));
            }
        }
        Ok(())
    }

    pub fn delete_settle(&self) -> Duration {
        Duration::from_millis(self.delete_settle_ms)
    }
}
