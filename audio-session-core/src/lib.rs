//! # audio-session-core
//!
//! Platform-agnostic microphone recording and file playback sessions.
//!
//! Provides PCM WAV encoding, test-tone synthesis, cache file layout and the
//! two session state machines behind a single coordinator. Platform backends
//! implement `CaptureDevice` and `PlaybackDevice` and plug into the generic
//! `SessionCoordinator`.
//!
//! ## Architecture
//!
//! ```text
//! audio-session-core (this crate)
//! ├── traits/       ← CaptureDevice, PlaybackDevice, PermissionGate, SessionEventSink
//! ├── models/       ← SessionError, RecordingState, PlaybackState, WavFormat, PcmBuffer, etc.
//! ├── device/       ← DeviceHandle, DeviceEvent channel, mock devices
//! ├── processing/   ← WAV codec, tone generator
//! ├── session/      ← RecordingSession, PlaybackSession, SessionCoordinator
//! └── storage/      ← cache paths, WAV files, checksums, metadata sidecars
//! ```

pub mod device;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use device::{event_channel, DeviceEvent, DeviceEventSender, DeviceHandle, HandleId};
pub use models::audio_models::{CodecConfig, PcmBuffer, RecordingCodec, SessionMode, WavFormat};
pub use models::config::SessionConfiguration;
pub use models::error::SessionError;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::{PlaybackState, RecordingState};
pub use processing::wav_codec::{WavContainer, WAV_HEADER_SIZE};
pub use session::coordinator::SessionCoordinator;
pub use session::playback::PlaybackSession;
pub use session::recording::RecordingSession;
pub use storage::paths::CachePaths;
pub use traits::capture_device::CaptureDevice;
pub use traits::event_sink::{LoggingEventSink, SessionEventSink};
pub use traits::permission_gate::{AlwaysGranted, PermissionGate};
pub use traits::playback_device::PlaybackDevice;
