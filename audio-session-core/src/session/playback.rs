use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::device::{DeviceEvent, DeviceEventSender, DeviceHandle, HandleId};
use crate::models::audio_models::SessionMode;
use crate::models::error::SessionError;
use crate::models::state::PlaybackState;
use crate::traits::event_sink::SessionEventSink;
use crate::traits::playback_device::PlaybackDevice;

/// File playback state machine.
///
/// `Completed` and `Stopped` are transient: the handle is released, the sink
/// sees the terminal state, and the session returns to `Idle`. `Failed`
/// persists until `reset` or `shutdown`.
pub struct PlaybackSession<D: PlaybackDevice> {
    device: D,
    state: PlaybackState,
    handle: Option<DeviceHandle>,
    file_path: Option<PathBuf>,
    events: DeviceEventSender,
    sink: Option<Arc<dyn SessionEventSink>>,
}

impl<D: PlaybackDevice> PlaybackSession<D> {
    pub fn new(device: D, events: DeviceEventSender) -> Self {
        Self {
            device,
            state: PlaybackState::Idle,
            handle: None,
            file_path: None,
            events,
            sink: None,
        }
    }

    pub fn set_event_sink(&mut self, sink: Arc<dyn SessionEventSink>) {
        self.sink = Some(sink);
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn handle_id(&self) -> Option<HandleId> {
        self.handle.as_ref().map(DeviceHandle::id)
    }

    /// Play the file at `path`. Transitions: idle → preparing → playing.
    pub fn start(&mut self, path: &Path) -> Result<(), SessionError> {
        if !self.state.is_idle() {
            return Err(self.reject("start playback"));
        }

        self.file_path = Some(path.to_path_buf());
        self.set_state(PlaybackState::Preparing);

        let handle = match self.device.open(path, self.events.clone()) {
            Ok(handle) => handle,
            Err(err) => return Err(self.fail(err)),
        };

        if let Err(err) = self.device.start(&handle) {
            self.device.release(handle);
            return Err(self.fail(err));
        }

        log::info!("Playback started: {}", path.display());
        self.handle = Some(handle);
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    /// Stop playback early. Transitions: playing → stopped → idle.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        if !self.state.is_playing() {
            return Err(self.reject("stop playback"));
        }

        let Some(handle) = self.handle.take() else {
            return Err(self.fail(SessionError::DeviceUnavailable("no playback handle held".into())));
        };
        let stopped = self.device.stop(&handle);
        self.device.release(handle);

        if let Err(err) = stopped {
            return Err(self.fail(err));
        }

        log::info!("Playback stopped");
        self.set_state(PlaybackState::Stopped);
        self.set_state(PlaybackState::Idle);
        Ok(())
    }

    pub fn owns(&self, event: &DeviceEvent) -> bool {
        self.handle_id() == Some(event.handle())
    }

    /// Apply an asynchronous device event. Returns whether it was applied.
    pub fn handle_device_event(&mut self, event: DeviceEvent) -> bool {
        if !self.owns(&event) || !self.state.is_playing() {
            return false;
        }
        let Some(handle) = self.handle.take() else {
            return false;
        };
        self.device.release(handle);

        match event {
            DeviceEvent::Completed(_) => {
                log::info!("Playback completed");
                self.set_state(PlaybackState::Completed);
                self.set_state(PlaybackState::Idle);
            }
            DeviceEvent::Error { reason, .. } => {
                log::error!("Playback device error: {}", reason);
                self.fail(SessionError::DeviceUnavailable(reason));
            }
        }
        true
    }

    /// Clear a `Failed` session back to idle. No-op when already idle.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.state.is_active() {
            return Err(self.reject("reset playback"));
        }
        if !self.state.is_idle() {
            self.set_state(PlaybackState::Idle);
        }
        Ok(())
    }

    /// Force the session back to idle from any state, releasing the device.
    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        let result = if self.state.is_playing() { self.stop() } else { Ok(()) };

        if let Some(handle) = self.handle.take() {
            log::warn!("Releasing playback handle {} during shutdown", handle.id());
            self.device.release(handle);
        }
        if !self.state.is_idle() {
            self.set_state(PlaybackState::Idle);
        }
        result
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
        log::error!("Playback failed: {}", err);
        self.notify_error(&err);
        self.set_state(PlaybackState::Failed(err.clone()));
        err
    }

    fn notify_error(&self, err: &SessionError) {
        if let Some(ref sink) = self.sink {
            sink.on_error(SessionMode::Playback, err);
        }
    }

    fn set_state(&mut self, new_state: PlaybackState) {
        self.state = new_state;
        if let Some(ref sink) = self.sink {
            sink.on_playback_state_changed(&self.state);
        }
    }
}

impl<D: PlaybackDevice> Drop for PlaybackSession<D> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::warn!("Playback session dropped while holding handle {}", handle.id());
            self.device.release(handle);
        }
    }
}
