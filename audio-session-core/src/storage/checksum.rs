use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::error::SessionError;

/// Compute SHA-256 hex digest of a file.
pub fn sha256_file(path: &Path) -> Result<String, SessionError> {
    let mut file = File::open(path).map_err(|e| SessionError::from_io(&e, path))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|e| SessionError::from_io(&e, path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
