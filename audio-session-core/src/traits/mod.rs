pub mod capture_device;
pub mod event_sink;
pub mod permission_gate;
pub mod playback_device;
