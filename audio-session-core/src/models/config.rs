use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::audio_models::{CodecConfig, WavFormat};
use super::error::SessionError;

/// Configuration for a session coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    /// Application cache root. Test tones live directly under it.
    pub cache_root: PathBuf,

    /// Recordings directory below `cache_root` (default: `audio`).
    pub recordings_subdir: String,

    /// File stem of the default recording; the extension follows the codec.
    pub recording_file_name: String,

    /// Codec used by `start_recording` when none is given.
    pub codec: CodecConfig,

    /// Format of synthesized test tones (default: 44100 Hz mono 16-bit).
    pub tone_format: WavFormat,

    /// Reuse a cached tone file when it already holds the requested tone.
    pub reuse_cached_tone: bool,

    /// Write `<recording>.metadata.json` next to each completed recording.
    pub write_metadata_sidecar: bool,
}

impl SessionConfiguration {
    pub fn with_cache_root(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.recordings_subdir.is_empty() {
            return Err("recordings subdirectory must not be empty".into());
        }
        if self.recording_file_name.is_empty() {
            return Err("recording file name must not be empty".into());
        }
        self.tone_format.validate()?;
        self.codec.validate().map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, SessionError> {
        let json = fs::read_to_string(path).map_err(|e| SessionError::from_io(&e, path))?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| SessionError::InvalidParameter(format!("failed to parse configuration: {}", e)))?;
        config.validate().map_err(SessionError::InvalidParameter)?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SessionError::InvalidParameter(format!("failed to serialize configuration: {}", e)))?;
        fs::write(path, json).map_err(|e| SessionError::from_io(&e, path))
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from("."),
            recordings_subdir: "audio".into(),
            recording_file_name: "audiorecord".into(),
            codec: CodecConfig::amr_nb(),
            tone_format: WavFormat::default(),
            reuse_cached_tone: true,
            write_metadata_sidecar: false,
        }
    }
}
