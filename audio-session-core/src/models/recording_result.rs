use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio_models::{CodecConfig, RecordingCodec};

/// Result returned when a recording session completes successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_secs: f64,
    pub file_size_bytes: u64,
    pub checksum: String,
    pub metadata: RecordingMetadata,
}

/// Metadata describing a finished recording.
///
/// Serializable for the optional JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub duration_secs: f64,
    pub file_path: String,
    pub file_size_bytes: u64,
    pub checksum: String,
    pub codec: RecordingCodec,
    pub sample_rate_hz: u32,
    pub channel_count: u16,
    pub created_at: String,
}

impl RecordingMetadata {
    pub fn new(
        duration_secs: f64,
        file_path: &str,
        file_size_bytes: u64,
        checksum: &str,
        codec: &CodecConfig,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            duration_secs,
            file_path: file_path.to_string(),
            file_size_bytes,
            checksum: checksum.to_string(),
            codec: codec.codec,
            sample_rate_hz: codec.sample_rate_hz,
            channel_count: codec.channel_count,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_serializes_codec_in_snake_case() {
        let metadata = RecordingMetadata::new(1.5, "/cache/audio/audiorecord.m4a", 2048, "abc", &CodecConfig::aac_mp4());
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["codec"], "aac_mp4");
        assert_eq!(json["sample_rate_hz"], 44100);
        assert!(uuid::Uuid::parse_str(&metadata.id).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&metadata.created_at).is_ok());
    }
}
