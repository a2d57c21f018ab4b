// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animator configuration.
//!
//! Settings are stored as RON and cover:
//! - Keyframe snap and roll-correction thresholds
//! - Output directory and image codec
//! - Optional output frame size
//! - Preview pacing

use crate::output::ImageCodec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "cinetrack.ron";

/// Errors while loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON for this format
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serializing failed
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("Configuration version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest supported version
        supported: u32,
    },
}

/// Animator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Format version
    pub version: u32,
    /// Adjacent keyframes closer than this are not interpolated between
    pub snap_threshold: f32,
    /// Height change per frame that triggers view-up correction
    pub roll_threshold: f32,
    /// Directory for rendered frames
    pub output_dir: PathBuf,
    /// Image format of rendered frames
    pub codec: ImageCodec,
    /// Render window size applied before a final render
    pub frame_size: Option<(u32, u32)>,
    /// Pause after each preview frame so playback is watchable
    pub preview_frame_delay_ms: u64,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            snap_threshold: 1.0,
            roll_threshold: 2.0,
            output_dir: PathBuf::from("."),
            codec: ImageCodec::Png,
            frame_size: None,
            preview_frame_delay_ms: 0,
        }
    }
}

impl AnimatorConfig {
    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Delay between preview frames
    pub fn preview_frame_delay(&self) -> Duration {
        Duration::from_millis(self.preview_frame_delay_ms)
    }

    /// Parse from a RON string
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: AnimatorConfig = ron::from_str(content)?;
        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }
        Ok(config)
    }

    /// Load from disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::info!("Loaded animator config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Save to disk
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnimatorConfig::default();
        assert_eq!(config.snap_threshold, 1.0);
        assert_eq!(config.roll_threshold, 2.0);
        assert_eq!(config.codec, ImageCodec::Png);
        assert_eq!(config.preview_frame_delay(), Duration::ZERO);
    }

    #[test]
    fn test_serialization() {
        let config = AnimatorConfig {
            snap_threshold: 0.25,
            frame_size: Some((640, 480)),
            ..AnimatorConfig::default()
        };
        let loaded = AnimatorConfig::from_ron(&config.to_ron().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded = AnimatorConfig::from_ron("(roll_threshold: 5.0)").unwrap();
        assert_eq!(loaded.roll_threshold, 5.0);
        assert_eq!(loaded.snap_threshold, 1.0);
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = AnimatorConfig::from_ron("(version: 99)").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion { found: 99, .. }));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir()
            .join(format!("cinetrack-config-{}.ron", uuid::Uuid::new_v4()));
        let config = AnimatorConfig {
            roll_threshold: 3.5,
            codec: ImageCodec::Jpeg,
            ..AnimatorConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AnimatorConfig::load(&path).unwrap(), config);

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(AnimatorConfig::load(&path), Err(ConfigError::Io(_))));
    }
}
