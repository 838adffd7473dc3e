//! Recorder configuration.
//!
//! The stream address, output folder, and segment duration are runtime
//! configuration, supplied through a TOML file, CLI flags, or both
//! (flags win). Validation happens once after merging, before a source
//! is opened.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for one recording run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Stream source address (scheme, credentials, host, port, channel).
    pub source: String,
    /// Directory receiving segment files; created if missing.
    pub output_dir: PathBuf,
    /// Target duration of one segment in seconds.
    pub segment_secs: u64,
    /// Seconds between heartbeat events.
    pub heartbeat_secs: u64,
    /// Encode worker threads.
    pub encode_workers: usize,
    /// Maximum segments queued for encoding before handoff blocks.
    pub max_in_flight: usize,
    /// Container extension for segment files.
    pub container_ext: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            output_dir: PathBuf::from("output"),
            segment_secs: 300, // five-minute segments
            heartbeat_secs: 60,
            encode_workers: 2,
            max_in_flight: 4,
            container_ext: "mp4".into(),
        }
    }
}

impl RecorderConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.is_empty() {
            return Err(ConfigError::MissingSource);
        }
        if self.segment_secs == 0 {
            return Err(ConfigError::InvalidSegmentDuration);
        }
        if self.encode_workers == 0 || self.max_in_flight == 0 {
            return Err(ConfigError::InvalidEncodePool);
        }
        if self.container_ext.is_empty() {
            return Err(ConfigError::InvalidContainerExtension);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("no stream source address configured")]
    MissingSource,
    #[error("segment duration must be at least one second")]
    InvalidSegmentDuration,
    #[error("encode workers and max in-flight segments must be nonzero")]
    InvalidEncodePool,
    #[error("container extension must not be empty")]
    InvalidContainerExtension,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Recorder settings.
    #[serde(default)]
    pub recorder: RecorderConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Values are not validated here; the caller merges CLI overrides
    /// first and validates the result.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> RecorderConfig {
        RecorderConfig {
            source: "rtsp://camera.local:554/stream".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_configured_valid() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_missing_source_invalid() {
        let config = RecorderConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingSource)));
    }

    #[test]
    fn test_zero_duration_invalid() {
        let mut config = configured();
        config.segment_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSegmentDuration)
        ));
    }

    #[test]
    fn test_zero_workers_invalid() {
        let mut config = configured();
        config.encode_workers = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEncodePool)
        ));
    }

    #[test]
    fn test_partial_file_section_uses_defaults() {
        let parsed: FileConfig = toml::from_str(
            r#"
            [recorder]
            source = "rtsp://camera.local:554/stream"
            segment_secs = 120
            "#,
        )
        .unwrap();

        assert_eq!(parsed.recorder.segment_secs, 120);
        assert_eq!(parsed.recorder.heartbeat_secs, 60);
        assert_eq!(parsed.recorder.container_ext, "mp4");
        assert!(parsed.recorder.validate().is_ok());
    }
}
