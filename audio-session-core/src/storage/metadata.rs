use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::SessionError;
use crate::models::recording_result::RecordingMetadata;

/// Sidecar path for a recording: `audiorecord.amr` → `audiorecord.amr.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    let mut name = recording_path.as_os_str().to_owned();
    name.push(".metadata.json");
    PathBuf::from(name)
}

/// Write recording metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), SessionError> {
    let metadata_path = metadata_path(recording_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| SessionError::PrepareFailed(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&metadata_path, json)
        .map_err(|e| SessionError::PrepareFailed(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, SessionError> {
    let metadata_path = metadata_path(recording_path);
    let json = fs::read_to_string(&metadata_path).map_err(|e| SessionError::from_io(&e, &metadata_path))?;
    let metadata: RecordingMetadata = serde_json::from_str(&json)
        .map_err(|e| SessionError::FormatError(format!("failed to parse metadata: {}", e)))?;
    Ok(metadata)
}
