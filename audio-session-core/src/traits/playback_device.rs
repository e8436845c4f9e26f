use std::path::Path;

use crate::device::{DeviceEventSender, DeviceHandle};
use crate::models::error::SessionError;

/// Interface for file-based audio output.
///
/// Natural end of stream is reported with `DeviceEventSender::completed`,
/// typically from the device's own thread.
pub trait PlaybackDevice: Send {
    /// Bind the output to the file at `path`.
    ///
    /// Expected errors: `FileNotFound` (missing file), `FormatError`
    /// (unsupported or malformed file), `DeviceUnavailable`.
    fn open(&mut self, path: &Path, events: DeviceEventSender) -> Result<DeviceHandle, SessionError>;

    /// Begin playback. A successful return is the device-ready signal.
    fn start(&mut self, handle: &DeviceHandle) -> Result<(), SessionError>;

    /// Stop playback early.
    fn stop(&mut self, handle: &DeviceHandle) -> Result<(), SessionError>;

    fn release(&mut self, handle: DeviceHandle);
}
