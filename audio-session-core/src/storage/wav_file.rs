use std::fs;
use std::path::Path;

use crate::models::audio_models::PcmBuffer;
use crate::models::error::SessionError;
use crate::processing::wav_codec;

/// Encode `pcm` and write it to `path`, creating parent directories.
///
/// Returns the number of bytes written.
pub fn write_pcm(path: &Path, pcm: &PcmBuffer) -> Result<u64, SessionError> {
    let bytes = wav_codec::encode(pcm)?;
    write_bytes(path, &bytes)
}

/// Write an already encoded WAV stream to `path`, creating parent directories.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<u64, SessionError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| SessionError::PrepareFailed(format!("failed to create directory: {}", e)))?;
    }

    fs::write(path, bytes).map_err(|e| SessionError::from_io(&e, path))?;
    Ok(bytes.len() as u64)
}

/// Read and decode the WAV file at `path`.
pub fn read_pcm(path: &Path) -> Result<PcmBuffer, SessionError> {
    let bytes = fs::read(path).map_err(|e| SessionError::from_io(&e, path))?;
    wav_codec::decode(&bytes)?.to_pcm()
}
