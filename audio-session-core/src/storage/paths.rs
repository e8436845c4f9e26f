use std::fs;
use std::path::PathBuf;

use crate::models::audio_models::CodecConfig;
use crate::models::config::SessionConfiguration;
use crate::models::error::SessionError;

/// Cache directory layout.
///
/// ```text
/// <cache_root>/
/// ├── audio/                        ← recordings, created on demand
/// │   └── audiorecord.<ext>
/// └── test_tone_440hz_2000ms.wav    ← synthesized tones
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    cache_root: PathBuf,
    recordings_subdir: String,
    recording_file_name: String,
}

impl CachePaths {
    pub fn new(config: &SessionConfiguration) -> Self {
        Self {
            cache_root: config.cache_root.clone(),
            recordings_subdir: config.recordings_subdir.clone(),
            recording_file_name: config.recording_file_name.clone(),
        }
    }

    pub fn cache_root(&self) -> &PathBuf {
        &self.cache_root
    }

    pub fn recordings_dir(&self) -> PathBuf {
        self.cache_root.join(&self.recordings_subdir)
    }

    /// Create the recordings directory if it doesn't exist.
    pub fn ensure_recordings_dir(&self) -> Result<PathBuf, SessionError> {
        let dir = self.recordings_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| SessionError::PrepareFailed(format!("failed to create {}: {}", dir.display(), e)))?;
        Ok(dir)
    }

    /// Default recording file for `codec`, e.g. `audio/audiorecord.amr`.
    pub fn recording_path(&self, codec: &CodecConfig) -> PathBuf {
        self.recordings_dir()
            .join(format!("{}.{}", self.recording_file_name, codec.codec.file_extension()))
    }

    /// Cache file for a synthesized tone, e.g. `test_tone_440hz_2000ms.wav`
    /// or `test_tone_440.4hz_2000ms.wav`. The duration is named in whole
    /// milliseconds, so callers must still check a cached file's content.
    pub fn tone_path(&self, frequency_hz: f64, duration_secs: f64) -> PathBuf {
        let millis = (duration_secs * 1000.0).round() as u64;
        self.cache_root
            .join(format!("test_tone_{}hz_{}ms.wav", frequency_hz, millis))
    }
}
