use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::device::{DeviceEvent, DeviceEventSender, DeviceHandle, HandleId};
use crate::models::audio_models::{CodecConfig, SessionMode};
use crate::models::error::SessionError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::RecordingState;
use crate::storage::{checksum, metadata};
use crate::traits::capture_device::CaptureDevice;
use crate::traits::event_sink::SessionEventSink;

/// Microphone recording state machine.
///
/// Owns the capture device and at most one `DeviceHandle`. Every path out of
/// an active state releases the handle before the state changes.
pub struct RecordingSession<D: CaptureDevice> {
    device: D,
    state: RecordingState,
    handle: Option<DeviceHandle>,
    file_path: Option<PathBuf>,
    codec: Option<CodecConfig>,
    events: DeviceEventSender,
    sink: Option<Arc<dyn SessionEventSink>>,
    write_metadata_sidecar: bool,
}

impl<D: CaptureDevice> RecordingSession<D> {
    pub fn new(device: D, events: DeviceEventSender) -> Self {
        Self {
            device,
            state: RecordingState::Idle,
            handle: None,
            file_path: None,
            codec: None,
            events,
            sink: None,
            write_metadata_sidecar: false,
        }
    }

    pub fn set_event_sink(&mut self, sink: Arc<dyn SessionEventSink>) {
        self.sink = Some(sink);
    }

    pub fn set_metadata_sidecar(&mut self, enabled: bool) {
        self.write_metadata_sidecar = enabled;
    }

    pub fn state(&self) -> &RecordingState {
        &self.state
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Output file of the current or last recording.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn handle_id(&self) -> Option<HandleId> {
        self.handle.as_ref().map(DeviceHandle::id)
    }

    /// Start recording to `path`. Transitions: idle → preparing → recording.
    ///
    /// On any device failure the session ends in `Failed` with no handle held.
    pub fn start(&mut self, path: &Path, codec: &CodecConfig) -> Result<(), SessionError> {
        if !self.state.is_idle() {
            return Err(self.reject("start recording"));
        }

        self.file_path = Some(path.to_path_buf());
        self.codec = Some(*codec);
        self.set_state(RecordingState::Preparing);

        if let Err(err) = codec.validate() {
            return Err(self.fail(err));
        }

        let handle = match self.device.open(path, codec, self.events.clone()) {
            Ok(handle) => handle,
            Err(err) => return Err(self.fail(err)),
        };

        if let Err(err) = self.device.start(&handle) {
            self.device.release(handle);
            return Err(self.fail(err));
        }

        log::info!("Recording started: {} ({:?})", path.display(), codec.codec);
        self.handle = Some(handle);
        self.set_state(RecordingState::Recording {
            started_at: Instant::now(),
        });
        Ok(())
    }

    /// Stop recording and finalize the file.
    /// Transitions: recording → stopping → completed/failed.
    pub fn stop(&mut self) -> Result<RecordingResult, SessionError> {
        let started_at = match &self.state {
            RecordingState::Recording { started_at } => *started_at,
            _ => return Err(self.reject("stop recording")),
        };
        let duration = started_at.elapsed();

        self.set_state(RecordingState::Stopping);

        let Some(handle) = self.handle.take() else {
            return Err(self.fail(SessionError::DeviceUnavailable("no capture handle held".into())));
        };
        let stopped = self.device.stop(&handle);
        self.device.release(handle);

        if let Err(err) = stopped {
            return Err(self.fail(err));
        }
        self.complete(duration)
    }

    /// Time since the device became ready. Only valid while recording.
    pub fn elapsed_duration(&self) -> Result<Duration, SessionError> {
        match &self.state {
            RecordingState::Recording { started_at } => Ok(started_at.elapsed()),
            other => Err(SessionError::InvalidState {
                operation: "read elapsed time",
                state: other.name(),
            }),
        }
    }

    /// Whether `event` addresses the handle this session holds.
    pub fn owns(&self, event: &DeviceEvent) -> bool {
        self.handle_id() == Some(event.handle())
    }

    /// Apply an asynchronous device event. Events for other handles are
    /// ignored; returns whether the event was applied.
    pub fn handle_device_event(&mut self, event: DeviceEvent) -> bool {
        if !self.owns(&event) {
            return false;
        }
        let RecordingState::Recording { started_at } = self.state else {
            return false;
        };
        let Some(handle) = self.handle.take() else {
            return false;
        };
        self.device.release(handle);

        match event {
            DeviceEvent::Completed(_) => {
                log::info!("Capture device finished on its own");
                self.set_state(RecordingState::Stopping);
                // A finalize failure has already gone through `fail` to the sink.
                let _ = self.complete(started_at.elapsed());
            }
            DeviceEvent::Error { reason, .. } => {
                log::error!("Capture device error: {}", reason);
                self.fail(SessionError::DeviceUnavailable(reason));
            }
        }
        true
    }

    /// Return a finished session to idle. No-op when already idle.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.state.is_active() {
            return Err(self.reject("reset recording"));
        }
        if self.state.is_terminal() {
            self.set_state(RecordingState::Idle);
        }
        Ok(())
    }

    /// Force the session back to idle from any state, releasing the device.
    ///
    /// An active recording is stopped and finalized; its error, if any, is
    /// returned after the session has reached idle.
    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        let result = if self.state.is_recording() {
            self.stop().map(|_| ())
        } else {
            Ok(())
        };

        if let Some(handle) = self.handle.take() {
            log::warn!("Releasing capture handle {} during shutdown", handle.id());
            self.device.release(handle);
        }
        if !self.state.is_idle() {
            self.set_state(RecordingState::Idle);
        }
        result
    }

    fn complete(&mut self, duration: Duration) -> Result<RecordingResult, SessionError> {
        match self.finalize(duration) {
            Ok(result) => {
                log::info!(
                    "Recording saved: {} ({} bytes)",
                    result.file_path.display(),
                    result.file_size_bytes
                );
                self.set_state(RecordingState::Completed(result.clone()));
                if let Some(ref sink) = self.sink {
                    sink.on_recording_finished(&result);
                }
                Ok(result)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn finalize(&self, duration: Duration) -> Result<RecordingResult, SessionError> {
        let (Some(path), Some(codec)) = (self.file_path.as_ref(), self.codec.as_ref()) else {
            return Err(SessionError::PrepareFailed("no recording in progress".into()));
        };

        let file_size_bytes = fs::metadata(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    SessionError::PrepareFailed(format!("recording file {} missing after stop", path.display()))
                }
                _ => SessionError::from_io(&e, path),
            })?
            .len();
        let checksum = checksum::sha256_file(path)?;
        let duration_secs = duration.as_secs_f64();

        let metadata = RecordingMetadata::new(
            duration_secs,
            &path.to_string_lossy(),
            file_size_bytes,
            &checksum,
            codec,
        );
        if self.write_metadata_sidecar {
            metadata::write_metadata(&metadata, path)?;
        }

        Ok(RecordingResult {
            file_path: path.clone(),
            duration_secs,
            file_size_bytes,
            checksum,
            metadata,
        })
    }

    fn reject(&self, operation: &'static str) -> SessionError {
        let err = SessionError::InvalidState {
            operation,
            state: self.state.name(),
        };
        log::warn!("Rejected: {}", err);
        self.notify_error(&err);
        err
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        if let Some(handle) = self.handle.take() {
            self.device.release(handle);
        }
        log::error!("Recording failed: {}", err);
        self.notify_error(&err);
        self.set_state(RecordingState::Failed(err.clone()));
        err
    }

    fn notify_error(&self, err: &SessionError) {
        if let Some(ref sink) = self.sink {
            sink.on_error(SessionMode::Capture, err);
        }
    }

    fn set_state(&mut self, new_state: RecordingState) {
        self.state = new_state;
        if let Some(ref sink) = self.sink {
            sink.on_recording_state_changed(&self.state);
        }
    }
}

impl<D: CaptureDevice> Drop for RecordingSession<D> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::warn!("Recording session dropped while holding handle {}", handle.id());
            self.device.release(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::event_channel;
    use crate::device::mock::{DeviceCall, MockBehavior, MockCaptureDevice};
    use crate::session::test_support::RecordingSink;

    fn session(device: MockCaptureDevice) -> (RecordingSession<MockCaptureDevice>, std::sync::mpsc::Receiver<DeviceEvent>) {
        let (tx, rx) = event_channel();
        (RecordingSession::new(device, tx), rx)
    }

    #[test]
    fn start_then_stop_completes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let device = MockCaptureDevice::new();
        let probe = device.probe();
        let (mut session, _rx) = session(device);

        session.start(&path, &CodecConfig::pcm_wav(8000, 1)).unwrap();
        assert!(session.state().is_recording());
        assert!(session.elapsed_duration().is_ok());

        let result = session.stop().unwrap();
        assert!(matches!(session.state(), RecordingState::Completed(r) if *r == result));
        assert_eq!(result.file_path, path);
        assert_eq!(result.file_size_bytes, fs::metadata(&path).unwrap().len());
        assert_eq!(result.checksum.len(), 64);
        assert_eq!(probe.open_handles(), 0);
        assert!(session.handle_id().is_none());
    }

    #[test]
    fn second_start_is_invalid_state() {
        let dir = tempfile::tempdir().unwrap();
        let device = MockCaptureDevice::new();
        let probe = device.probe();
        let (mut session, _rx) = session(device);

        session.start(&dir.path().join("a.amr"), &CodecConfig::amr_nb()).unwrap();
        let err = session.start(&dir.path().join("b.amr"), &CodecConfig::amr_nb()).unwrap_err();

        assert_eq!(
            err,
            SessionError::InvalidState {
                operation: "start recording",
                state: "recording"
            }
        );
        assert!(session.state().is_recording());
        assert_eq!(session.file_path(), Some(dir.path().join("a.amr").as_path()));
        let opens = probe.calls().iter().filter(|c| matches!(c, DeviceCall::Open(_))).count();
        assert_eq!(opens, 1);
        assert_eq!(probe.open_handles(), 1);
    }

    #[test]
    fn stop_when_idle_is_invalid_state() {
        let (mut session, _rx) = session(MockCaptureDevice::new());
        assert!(matches!(session.stop(), Err(SessionError::InvalidState { .. })));
        assert!(session.state().is_idle());
        assert!(matches!(session.elapsed_duration(), Err(SessionError::InvalidState { .. })));
    }

    #[test]
    fn open_failure_leaves_no_handle() {
        let dir = tempfile::tempdir().unwrap();
        let device = MockCaptureDevice::with_behavior(MockBehavior {
            fail_open: Some(SessionError::DeviceUnavailable("mic busy".into())),
            ..Default::default()
        });
        let probe = device.probe();
        let (mut session, _rx) = session(device);
        let sink = RecordingSink::new();
        session.set_event_sink(sink.clone());

        let err = session.start(&dir.path().join("a.amr"), &CodecConfig::amr_nb()).unwrap_err();
        assert_eq!(err, SessionError::DeviceUnavailable("mic busy".into()));
        assert_eq!(session.state(), &RecordingState::Failed(err.clone()));
        assert_eq!(probe.open_handles(), 0);
        assert_eq!(sink.recording_states(), vec!["preparing", "failed"]);
        assert_eq!(sink.errors().len(), 1);
    }

    #[test]
    fn start_failure_releases_handle() {
        let dir = tempfile::tempdir().unwrap();
        let device = MockCaptureDevice::with_behavior(MockBehavior {
            fail_start: Some(SessionError::PrepareFailed("encoder init".into())),
            ..Default::default()
        });
        let probe = device.probe();
        let (mut session, _rx) = session(device);

        assert!(session.start(&dir.path().join("a.m4a"), &CodecConfig::aac_mp4()).is_err());
        assert_eq!(probe.open_handles(), 0);
        assert!(matches!(probe.calls().last(), Some(DeviceCall::Release(_))));
    }

    #[test]
    fn unsupported_codec_fails_before_open() {
        let dir = tempfile::tempdir().unwrap();
        let device = MockCaptureDevice::new();
        let probe = device.probe();
        let (mut session, _rx) = session(device);
        let codec = CodecConfig {
            channel_count: 2,
            ..CodecConfig::amr_nb()
        };

        let err = session.start(&dir.path().join("a.amr"), &codec).unwrap_err();
        assert!(matches!(err, SessionError::FormatError(_)));
        assert_eq!(probe.call_count(), 0);
    }

    #[test]
    fn stop_failure_still_releases() {
        let dir = tempfile::tempdir().unwrap();
        let device = MockCaptureDevice::with_behavior(MockBehavior {
            fail_stop: Some(SessionError::PrepareFailed("disk full".into())),
            ..Default::default()
        });
        let probe = device.probe();
        let (mut session, _rx) = session(device);

        session.start(&dir.path().join("a.amr"), &CodecConfig::amr_nb()).unwrap();
        let err = session.stop().unwrap_err();
        assert_eq!(err, SessionError::PrepareFailed("disk full".into()));
        assert_eq!(session.state(), &RecordingState::Failed(err));
        assert_eq!(probe.open_handles(), 0);
    }

    #[test]
    fn device_error_while_recording_fails_session() {
        let dir = tempfile::tempdir().unwrap();
        let device = MockCaptureDevice::new();
        let probe = device.probe();
        let (mut session, rx) = session(device);

        session.start(&dir.path().join("a.amr"), &CodecConfig::amr_nb()).unwrap();
        probe.emit_error("unplugged");
        let event = rx.try_recv().unwrap();

        assert!(session.handle_device_event(event));
        assert_eq!(
            session.state(),
            &RecordingState::Failed(SessionError::DeviceUnavailable("unplugged".into()))
        );
        assert_eq!(probe.open_handles(), 0);
    }

    #[test]
    fn device_completion_without_output_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let device = MockCaptureDevice::new();
        let probe = device.probe();
        let (mut session, rx) = session(device);
        let sink = RecordingSink::new();
        session.set_event_sink(sink.clone());

        // The mock only writes its file on `stop`, so nothing is on disk here.
        session.start(&dir.path().join("a.amr"), &CodecConfig::amr_nb()).unwrap();
        probe.emit_completed();

        assert!(session.handle_device_event(rx.try_recv().unwrap()));
        assert!(matches!(session.state(), RecordingState::Failed(SessionError::PrepareFailed(_))));
        assert_eq!(sink.recording_states(), vec!["preparing", "recording", "stopping", "failed"]);
        assert_eq!(sink.errors().len(), 1);
        assert!(sink.finished().is_empty());
        assert_eq!(probe.open_handles(), 0);
    }

    #[test]
    fn stale_event_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _rx) = session(MockCaptureDevice::new());
        session.start(&dir.path().join("a.amr"), &CodecConfig::amr_nb()).unwrap();

        let stale = DeviceEvent::Completed(DeviceHandle::new("other").id());
        assert!(!session.handle_device_event(stale));
        assert!(session.state().is_recording());
    }

    #[test]
    fn reset_and_record_again() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _rx) = session(MockCaptureDevice::new());
        let path = dir.path().join("a.amr");

        session.start(&path, &CodecConfig::amr_nb()).unwrap();
        session.stop().unwrap();
        assert!(session.start(&path, &CodecConfig::amr_nb()).is_err());

        session.reset().unwrap();
        assert!(session.state().is_idle());
        session.start(&path, &CodecConfig::amr_nb()).unwrap();
        assert!(session.reset().is_err());
    }

    #[test]
    fn shutdown_finalizes_active_recording() {
        let dir = tempfile::tempdir().unwrap();
        let device = MockCaptureDevice::new();
        let probe = device.probe();
        let (mut session, _rx) = session(device);
        let path = dir.path().join("a.amr");

        session.start(&path, &CodecConfig::amr_nb()).unwrap();
        session.shutdown().unwrap();
        assert!(session.state().is_idle());
        assert!(path.exists());
        assert_eq!(probe.open_handles(), 0);
    }

    #[test]
    fn sidecar_written_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _rx) = session(MockCaptureDevice::new());
        session.set_metadata_sidecar(true);
        let path = dir.path().join("a.m4a");

        session.start(&path, &CodecConfig::aac_mp4()).unwrap();
        let result = session.stop().unwrap();
        assert_eq!(metadata::read_metadata(&path).unwrap(), result.metadata);
    }

    #[test]
    fn drop_releases_held_handle() {
        let dir = tempfile::tempdir().unwrap();
        let device = MockCaptureDevice::new();
        let probe = device.probe();
        let (mut session, _rx) = session(device);

        session.start(&dir.path().join("a.amr"), &CodecConfig::amr_nb()).unwrap();
        drop(session);
        assert_eq!(probe.open_handles(), 0);
    }
}
