use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use crate::device::{event_channel, DeviceEvent};
use crate::models::audio_models::{CodecConfig, SessionMode};
use crate::models::config::SessionConfiguration;
use crate::models::error::SessionError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::{PlaybackState, RecordingState};
use crate::processing::{tone, wav_codec};
use crate::session::playback::PlaybackSession;
use crate::session::recording::RecordingSession;
use crate::storage::paths::CachePaths;
use crate::storage::wav_file;
use crate::traits::capture_device::CaptureDevice;
use crate::traits::event_sink::SessionEventSink;
use crate::traits::permission_gate::PermissionGate;
use crate::traits::playback_device::PlaybackDevice;

/// Application-facing façade over one recording and one playback session.
///
/// At most one of the two sessions is active at a time. The coordinator is
/// the single control point: it is driven from one thread, and device
/// callbacks only take effect when that thread calls [`pump_events`] or
/// [`wait_for_event`]. Public operations pump pending events first so they
/// observe every completion that arrived before them.
///
/// ```text
/// UI action ─┐
///            ├→ [SessionCoordinator] → [RecordingSession] → CaptureDevice
/// device  ───┘        │              → [PlaybackSession]  → PlaybackDevice
/// events (mpsc)       └→ tone::generate → wav_codec::encode → cache file
/// ```
///
/// [`pump_events`]: SessionCoordinator::pump_events
/// [`wait_for_event`]: SessionCoordinator::wait_for_event
pub struct SessionCoordinator<C: CaptureDevice, P: PlaybackDevice> {
    config: SessionConfiguration,
    paths: CachePaths,
    recording: RecordingSession<C>,
    playback: PlaybackSession<P>,
    permissions: Box<dyn PermissionGate>,
    sink: Option<Arc<dyn SessionEventSink>>,
    events: Receiver<DeviceEvent>,
}

impl<C: CaptureDevice, P: PlaybackDevice> SessionCoordinator<C, P> {
    pub fn new(
        config: SessionConfiguration,
        capture: C,
        playback: P,
        permissions: impl PermissionGate + 'static,
    ) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::InvalidParameter)?;

        let (tx, rx) = event_channel();
        let mut recording = RecordingSession::new(capture, tx.clone());
        recording.set_metadata_sidecar(config.write_metadata_sidecar);

        Ok(Self {
            paths: CachePaths::new(&config),
            config,
            recording,
            playback: PlaybackSession::new(playback, tx),
            permissions: Box::new(permissions),
            sink: None,
            events: rx,
        })
    }

    pub fn set_event_sink(&mut self, sink: Arc<dyn SessionEventSink>) {
        self.recording.set_event_sink(Arc::clone(&sink));
        self.playback.set_event_sink(Arc::clone(&sink));
        self.sink = Some(sink);
    }

    pub fn config(&self) -> &SessionConfiguration {
        &self.config
    }

    pub fn paths(&self) -> &CachePaths {
        &self.paths
    }

    pub fn recording(&self) -> &RecordingSession<C> {
        &self.recording
    }

    pub fn playback(&self) -> &PlaybackSession<P> {
        &self.playback
    }

    pub fn recording_state(&self) -> &RecordingState {
        self.recording.state()
    }

    pub fn playback_state(&self) -> &PlaybackState {
        self.playback.state()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.state().is_active()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.state().is_active()
    }

    /// Default recording file for the configured codec.
    pub fn default_recording_path(&self) -> PathBuf {
        self.paths.recording_path(&self.config.codec)
    }

    /// Whether there is a finished default recording to play.
    pub fn recording_exists(&self) -> bool {
        !self.is_recording() && self.default_recording_path().is_file()
    }

    pub fn recording_elapsed(&self) -> Result<Duration, SessionError> {
        self.recording.elapsed_duration()
    }

    /// Record to `path` with the configured codec.
    pub fn start_recording(&mut self, path: &Path) -> Result<(), SessionError> {
        let codec = self.config.codec;
        self.start_recording_with(path, &codec)
    }

    /// Record to the default file under the recordings directory.
    pub fn start_default_recording(&mut self) -> Result<PathBuf, SessionError> {
        let path = self.default_recording_path();
        self.start_recording(&path)?;
        Ok(path)
    }

    /// Record to `path` with an explicit codec.
    ///
    /// Rejected with `SessionConflict` while playback is active and with
    /// `PermissionDenied` (after requesting access) while the microphone is
    /// not granted.
    pub fn start_recording_with(&mut self, path: &Path, codec: &CodecConfig) -> Result<(), SessionError> {
        self.pump_events();

        if self.is_playing() {
            return Err(self.conflict(SessionMode::Capture, SessionMode::Playback));
        }

        if !self.permissions.microphone_granted() {
            log::warn!("Microphone not granted; requesting permission");
            self.permissions.request_microphone();
            return Err(self.report(SessionMode::Capture, SessionError::PermissionDenied));
        }

        if self.recording.state().is_terminal() {
            self.recording.reset()?;
        }

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                let err = SessionError::PrepareFailed(format!("failed to create {}: {}", parent.display(), e));
                return Err(self.report(SessionMode::Capture, err));
            }
        }

        self.recording.start(path, codec)
    }

    pub fn stop_recording(&mut self) -> Result<RecordingResult, SessionError> {
        self.pump_events();
        self.recording.stop()
    }

    /// Play the file at `path`.
    ///
    /// Rejected with `SessionConflict` while recording is active; the
    /// recording is left untouched.
    pub fn start_playback(&mut self, path: &Path) -> Result<(), SessionError> {
        self.pump_events();

        if self.is_recording() {
            return Err(self.conflict(SessionMode::Playback, SessionMode::Capture));
        }

        if self.playback.state().is_terminal() {
            self.playback.reset()?;
        }
        self.playback.start(path)
    }

    pub fn stop_playback(&mut self) -> Result<(), SessionError> {
        self.pump_events();
        self.playback.stop()
    }

    /// Synthesize a tone into the cache and play it.
    ///
    /// Returns the path of the cached WAV file.
    pub fn play_test_tone(&mut self, frequency_hz: f64, duration_secs: f64) -> Result<PathBuf, SessionError> {
        self.pump_events();

        if self.is_recording() {
            return Err(self.conflict(SessionMode::Playback, SessionMode::Capture));
        }
        // The cache file may be the one currently playing.
        if self.playback.state().is_active() {
            let err = SessionError::InvalidState {
                operation: "start playback",
                state: self.playback.state().name(),
            };
            log::warn!("Rejected: {}", err);
            return Err(self.report(SessionMode::Playback, err));
        }

        let path = match self.cached_tone(frequency_hz, duration_secs) {
            Ok(path) => path,
            Err(err) => return Err(self.report(SessionMode::Playback, err)),
        };
        self.start_playback(&path)?;
        Ok(path)
    }

    /// Tear both sessions down to idle, releasing every device handle.
    ///
    /// Idempotent and safe in any state. Teardown always completes; the first
    /// error encountered on the way is returned afterwards.
    pub fn stop_all(&mut self) -> Result<(), SessionError> {
        self.pump_events();

        let recording = self.recording.shutdown();
        let playback = self.playback.shutdown();
        recording.and(playback)
    }

    /// Final teardown for the owning application shell.
    pub fn dispose(mut self) -> Result<(), SessionError> {
        log::info!("Disposing session coordinator");
        self.stop_all()
    }

    /// Apply every queued device event. Returns the number applied.
    pub fn pump_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            if self.dispatch(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Block up to `timeout` for a device event, then apply it and anything
    /// else queued. Returns whether any event was applied.
    pub fn wait_for_event(&mut self, timeout: Duration) -> bool {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                let first = self.dispatch(event);
                let rest = self.pump_events();
                first || rest > 0
            }
            Err(_) => false,
        }
    }

    fn dispatch(&mut self, event: DeviceEvent) -> bool {
        if self.recording.owns(&event) {
            self.recording.handle_device_event(event)
        } else if self.playback.owns(&event) {
            self.playback.handle_device_event(event)
        } else {
            log::warn!("Ignoring stale device event for handle {}", event.handle());
            false
        }
    }

    fn cached_tone(&self, frequency_hz: f64, duration_secs: f64) -> Result<PathBuf, SessionError> {
        let format = self.config.tone_format;
        let pcm = tone::generate(frequency_hz, duration_secs, &format)?;
        let encoded = wav_codec::encode(&pcm)?;
        let path = self.paths.tone_path(frequency_hz, duration_secs);

        // Reuse only a byte-identical copy of the requested tone.
        if self.config.reuse_cached_tone && fs::read(&path).map(|b| b == encoded).unwrap_or(false) {
            log::debug!("Reusing cached tone {}", path.display());
            return Ok(path);
        }

        let written = wav_file::write_bytes(&path, &encoded)?;
        log::info!("Test tone written: {} ({} bytes)", path.display(), written);
        Ok(path)
    }

    fn conflict(&self, requested: SessionMode, active: SessionMode) -> SessionError {
        log::warn!("Rejected {} start: {} session is active", requested, active);
        self.report(requested, SessionError::SessionConflict { active })
    }

    fn report(&self, mode: SessionMode, err: SessionError) -> SessionError {
        if let Some(ref sink) = self.sink {
            sink.on_error(mode, &err);
        }
        err
    }
}
