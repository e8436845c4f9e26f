use crate::models::audio_models::SessionMode;
use crate::models::error::SessionError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::{PlaybackState, RecordingState};

/// Receiver of session notifications.
///
/// Called synchronously from the session control point. The core never
/// presents anything to the user itself; shells translate these into UI
/// messages.
pub trait SessionEventSink: Send + Sync {
    /// Called on every recording state transition.
    fn on_recording_state_changed(&self, state: &RecordingState);

    /// Called on every playback state transition.
    fn on_playback_state_changed(&self, state: &PlaybackState);

    /// Called for every failure, including ones also returned to the caller.
    fn on_error(&self, mode: SessionMode, error: &SessionError);

    /// Called when a recording is finalized on disk.
    fn on_recording_finished(&self, result: &RecordingResult);
}

/// Sink that writes every notification to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink;

impl SessionEventSink for LoggingEventSink {
    fn on_recording_state_changed(&self, state: &RecordingState) {
        log::info!("Recording state: {}", state.name());
    }

    fn on_playback_state_changed(&self, state: &PlaybackState) {
        log::info!("Playback state: {}", state.name());
    }

    fn on_error(&self, mode: SessionMode, error: &SessionError) {
        log::error!("{} session error: {}", mode, error);
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        log::info!(
            "Recording saved to {} ({} bytes, {:.1}s)",
            result.file_path.display(),
            result.file_size_bytes,
            result.duration_secs
        );
    }
}
