use std::time::Instant;

use super::error::SessionError;
use super::recording_result::RecordingResult;

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → preparing → recording → stopping → completed
///            ↓           ↓           ↓
///          failed      failed      failed
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingState {
    Idle,
    Preparing,
    Recording { started_at: Instant },
    Stopping,
    Completed(RecordingResult),
    Failed(SessionError),
}

impl RecordingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    /// Neither idle nor terminal.
    pub fn is_active(&self) -> bool {
        !self.is_idle() && !self.is_terminal()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Recording { .. } => "recording",
            Self::Stopping => "stopping",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }
}

/// Playback session state machine.
///
/// State transitions:
/// ```text
/// idle → preparing → playing → completed → idle
///            ↓          ↓   ↘ stopped   → idle
///          failed     failed
/// ```
///
/// `Completed` and `Stopped` are reported to the event sink and then
/// immediately replaced by `Idle`.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    Idle,
    Preparing,
    Playing,
    Completed,
    Stopped,
    Failed(SessionError),
}

impl PlaybackState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed(_))
    }

    pub fn is_active(&self) -> bool {
        !self.is_idle() && !self.is_terminal()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Playing => "playing",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_activity() {
        assert!(!RecordingState::Idle.is_active());
        assert!(RecordingState::Preparing.is_active());
        assert!(RecordingState::Recording {
            started_at: Instant::now()
        }
        .is_active());
        assert!(!RecordingState::Failed(SessionError::PermissionDenied).is_active());
    }

    #[test]
    fn playback_terminal_states() {
        assert!(PlaybackState::Completed.is_terminal());
        assert!(PlaybackState::Stopped.is_terminal());
        assert!(!PlaybackState::Playing.is_terminal());
        assert!(PlaybackState::Playing.is_active());
    }
}
