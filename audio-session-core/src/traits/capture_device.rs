use std::path::Path;

use crate::device::{DeviceEventSender, DeviceHandle};
use crate::models::audio_models::CodecConfig;
use crate::models::error::SessionError;

/// Interface for the platform microphone input.
///
/// Implemented by platform backends and by `MockCaptureDevice`.
/// All methods are called from the session control point and must not block
/// for the duration of device I/O. Failures while running are reported via
/// the `DeviceEventSender` handed to `open`.
pub trait CaptureDevice: Send {
    /// Bind the microphone to `path`, encoding with `codec`.
    ///
    /// Expected errors: `DeviceUnavailable` (busy or missing hardware),
    /// `PrepareFailed` (output file or codec could not be opened),
    /// `FormatError` (codec parameters unsupported by the device).
    fn open(&mut self, path: &Path, codec: &CodecConfig, events: DeviceEventSender) -> Result<DeviceHandle, SessionError>;

    /// Begin capturing. A successful return is the device-ready signal.
    fn start(&mut self, handle: &DeviceHandle) -> Result<(), SessionError>;

    /// Stop capturing and finalize the output file.
    fn stop(&mut self, handle: &DeviceHandle) -> Result<(), SessionError>;

    /// Release the handle. Must succeed even after a failed `stop`.
    fn release(&mut self, handle: DeviceHandle);
}
