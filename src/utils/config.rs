//! Application configuration
//!
//! Pipeline constants, detector settings and the top-level configuration
//! loaded from disk.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::detector::DetectorConfig;

/// Target sampling rate for both extraction paths (frames per second)
pub const TARGET_FPS: u32 = 25;

/// Number of frames the translation model expects
pub const MAX_SEQ_LEN: usize = 190;

/// Auto-stop limit for a live recording
pub const MAX_RECORDING_SECS: u32 = 8;

/// Square input size expected by the hand detector
pub const DETECTOR_FRAME_SIZE: u32 = 224;

/// Longest clip the batch path accepts
pub const MAX_CLIP_SECS: u32 = 300;

/// Environment variable overriding the translation service URL
pub const SERVICE_URL_ENV: &str = "SIGNLENS_SERVICE_URL";

// =============================================================================
// Pipeline
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Frames sampled per second of video
    pub target_fps: u32,

    /// Length every landmark sequence is normalized to
    pub max_seq_len: usize,

    /// Recording stops automatically after this many seconds
    pub max_recording_secs: u32,

    /// Clips reporting a longer duration are rejected before extraction
    #[serde(default = "default_max_clip_secs")]
    pub max_clip_secs: u32,

    /// How long the batch path waits for video metadata
    #[serde(default = "default_metadata_timeout_secs")]
    pub metadata_timeout_secs: u64,

    /// How long the batch path waits for one detection result
    #[serde(default = "default_detection_timeout_secs")]
    pub detection_timeout_secs: u64,
}

fn default_max_clip_secs() -> u32 {
    MAX_CLIP_SECS
}

fn default_metadata_timeout_secs() -> u64 {
    10
}

fn default_detection_timeout_secs() -> u64 {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_fps: TARGET_FPS,
            max_seq_len: MAX_SEQ_LEN,
            max_recording_secs: MAX_RECORDING_SECS,
            max_clip_secs: default_max_clip_secs(),
            metadata_timeout_secs: default_metadata_timeout_secs(),
            detection_timeout_secs: default_detection_timeout_secs(),
        }
    }
}

impl PipelineConfig {
    /// Live sampling period in milliseconds (`1000 / fps`)
    pub fn sample_period_ms(&self) -> u64 {
        1000 / u64::from(self.target_fps.max(1))
    }
}

// =============================================================================
// Application
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Endpoint receiving landmark sequences
    pub service_url: String,

    /// Translation method sent for uploaded clips (user selectable)
    pub method: String,

    /// Translation method sent for live recordings
    pub live_method: String,

    /// Request timeout for the translation service
    pub request_timeout_secs: u64,

    /// Directory holding persisted history and preferences
    pub data_dir: PathBuf,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub detector: DetectorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000/translate".to_string(),
            method: "transformer".to_string(),
            live_method: "transformer".to_string(),
            request_timeout_secs: 60,
            data_dir: PathBuf::from(".signlens"),
            pipeline: PipelineConfig::default(),
            detector: DetectorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, then apply environment overrides
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let mut config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.apply_env();

        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
            if !url.trim().is_empty() {
                self.service_url = url.trim().to_string();
            }
        }
    }

    /// File backing the key-value store
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.target_fps, 25);
        assert_eq!(config.max_seq_len, 190);
        assert_eq!(config.max_recording_secs, 8);
        assert_eq!(config.max_clip_secs, 300);
        assert_eq!(config.sample_period_ms(), 40);
    }

    #[test]
    fn test_load_partial_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "serviceUrl": "http://example.test/api",
                "method": "lstm",
                "liveMethod": "transformer",
                "requestTimeoutSecs": 5,
                "dataDir": "/tmp/signlens"
            }"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.method, "lstm");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.detector.max_num_hands, 2);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.pipeline.max_seq_len, MAX_SEQ_LEN);
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
