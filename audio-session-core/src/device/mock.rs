//! Deterministic in-memory devices for exercising the session state
//! machines without hardware.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{DeviceEventSender, DeviceHandle, HandleId};
use crate::models::audio_models::{CodecConfig, PcmBuffer, RecordingCodec};
use crate::models::error::SessionError;
use crate::processing::wav_codec;
use crate::traits::capture_device::CaptureDevice;
use crate::traits::playback_device::PlaybackDevice;

/// A call made on a mock device, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Open(PathBuf),
    Start(HandleId),
    Stop(HandleId),
    Release(HandleId),
}

/// Scripted outcomes for a mock device.
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    pub fail_open: Option<SessionError>,
    pub fail_start: Option<SessionError>,
    pub fail_stop: Option<SessionError>,
    /// Emit `Completed` as soon as `start` succeeds.
    pub complete_on_start: bool,
}

#[derive(Debug, Default)]
struct ProbeState {
    calls: Vec<DeviceCall>,
    open_handles: HashSet<HandleId>,
    last_handle: Option<HandleId>,
    events: Option<DeviceEventSender>,
}

/// Shared view into a mock device.
///
/// Cloneable so a test keeps it after the device moves into a session.
#[derive(Debug, Clone, Default)]
pub struct DeviceProbe {
    inner: Arc<Mutex<ProbeState>>,
}

impl DeviceProbe {
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }

    /// Handles opened and not yet released.
    pub fn open_handles(&self) -> usize {
        self.inner.lock().open_handles.len()
    }

    pub fn last_handle(&self) -> Option<HandleId> {
        self.inner.lock().last_handle
    }

    /// Raise `Completed` for the most recently opened handle.
    pub fn emit_completed(&self) {
        let s = self.inner.lock();
        if let (Some(events), Some(handle)) = (&s.events, s.last_handle) {
            events.completed(handle);
        }
    }

    /// Raise `Error` for the most recently opened handle.
    pub fn emit_error(&self, reason: &str) {
        let s = self.inner.lock();
        if let (Some(events), Some(handle)) = (&s.events, s.last_handle) {
            events.error(handle, reason);
        }
    }

    fn record(&self, call: DeviceCall) {
        self.inner.lock().calls.push(call);
    }

    fn opened(&self, handle: HandleId, events: DeviceEventSender) {
        let mut s = self.inner.lock();
        s.open_handles.insert(handle);
        s.last_handle = Some(handle);
        s.events = Some(events);
    }

    fn released(&self, handle: HandleId) {
        let mut s = self.inner.lock();
        s.calls.push(DeviceCall::Release(handle));
        if !s.open_handles.remove(&handle) {
            log::warn!("Mock device released unknown handle {}", handle);
        }
    }

    fn events(&self) -> Option<DeviceEventSender> {
        self.inner.lock().events.clone()
    }
}

fn scripted(result: &Option<SessionError>) -> Result<(), SessionError> {
    match result {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

/// Mock microphone. Writes a placeholder file for the chosen codec on a
/// successful `stop`.
#[derive(Debug, Default)]
pub struct MockCaptureDevice {
    behavior: MockBehavior,
    probe: DeviceProbe,
    codec: Option<CodecConfig>,
}

impl MockCaptureDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            ..Default::default()
        }
    }

    pub fn probe(&self) -> DeviceProbe {
        self.probe.clone()
    }

    fn write_output(&self, path: &Path) -> Result<(), SessionError> {
        let bytes = match self.codec {
            Some(codec) => match (codec.codec, codec.wav_format()) {
                (RecordingCodec::PcmWav, Some(format)) => {
                    let silence = PcmBuffer::new(format, vec![0; format.channel_count as usize * 160])?;
                    wav_codec::encode(&silence)?
                }
                (RecordingCodec::AacMp4, _) => b"\0\0\0\x18ftypM4A \0\0\0\0isomM4A ".to_vec(),
                _ => b"#!AMR\n".to_vec(),
            },
            None => Vec::new(),
        };
        fs::write(path, bytes).map_err(|e| SessionError::from_io(&e, path))
    }
}

impl CaptureDevice for MockCaptureDevice {
    fn open(&mut self, path: &Path, codec: &CodecConfig, events: DeviceEventSender) -> Result<DeviceHandle, SessionError> {
        self.probe.record(DeviceCall::Open(path.to_path_buf()));
        scripted(&self.behavior.fail_open)?;
        codec.validate()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(SessionError::PrepareFailed(format!(
                    "output directory {} does not exist",
                    parent.display()
                )));
            }
        }

        self.codec = Some(*codec);
        let handle = DeviceHandle::new(path);
        self.probe.opened(handle.id(), events);
        Ok(handle)
    }

    fn start(&mut self, handle: &DeviceHandle) -> Result<(), SessionError> {
        self.probe.record(DeviceCall::Start(handle.id()));
        scripted(&self.behavior.fail_start)?;
        if self.behavior.complete_on_start {
            if let Some(events) = self.probe.events() {
                events.completed(handle.id());
            }
        }
        Ok(())
    }

    fn stop(&mut self, handle: &DeviceHandle) -> Result<(), SessionError> {
        self.probe.record(DeviceCall::Stop(handle.id()));
        scripted(&self.behavior.fail_stop)?;
        self.write_output(handle.path())
    }

    fn release(&mut self, handle: DeviceHandle) {
        self.probe.released(handle.id());
    }
}

/// Mock file output. Validates the target like a real player would: a
/// missing file is `FileNotFound`, a malformed `.wav` is `FormatError`.
#[derive(Debug, Default)]
pub struct MockPlaybackDevice {
    behavior: MockBehavior,
    probe: DeviceProbe,
}

impl MockPlaybackDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            ..Default::default()
        }
    }

    /// Playback that finishes as soon as it starts.
    pub fn auto_completing() -> Self {
        Self::with_behavior(MockBehavior {
            complete_on_start: true,
            ..Default::default()
        })
    }

    pub fn probe(&self) -> DeviceProbe {
        self.probe.clone()
    }
}

impl PlaybackDevice for MockPlaybackDevice {
    fn open(&mut self, path: &Path, events: DeviceEventSender) -> Result<DeviceHandle, SessionError> {
        self.probe.record(DeviceCall::Open(path.to_path_buf()));
        scripted(&self.behavior.fail_open)?;

        let bytes = fs::read(path).map_err(|e| SessionError::from_io(&e, path))?;
        let is_wav = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);
        if is_wav {
            wav_codec::decode(&bytes)?;
        }

        let handle = DeviceHandle::new(path);
        self.probe.opened(handle.id(), events);
        Ok(handle)
    }

    fn start(&mut self, handle: &DeviceHandle) -> Result<(), SessionError> {
        self.probe.record(DeviceCall::Start(handle.id()));
        scripted(&self.behavior.fail_start)?;
        if self.behavior.complete_on_start {
            if let Some(events) = self.probe.events() {
                events.completed(handle.id());
            }
        }
        Ok(())
    }

    fn stop(&mut self, handle: &DeviceHandle) -> Result<(), SessionError> {
        self.probe.record(DeviceCall::Stop(handle.id()));
        scripted(&self.behavior.fail_stop)
    }

    fn release(&mut self, handle: DeviceHandle) {
        self.probe.released(handle.id());
    }
}
