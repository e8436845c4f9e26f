pub mod coordinator;
pub mod playback;
pub mod recording;
