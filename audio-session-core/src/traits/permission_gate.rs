/// Microphone permission check supplied by the application shell.
///
/// Recording is never attempted while `microphone_granted` is false; the
/// coordinator calls `request_microphone` instead and reports
/// `PermissionDenied`.
pub trait PermissionGate: Send {
    fn microphone_granted(&self) -> bool;

    /// Ask the user for access. The outcome arrives out of band; the next
    /// `start_recording` re-checks `microphone_granted`.
    fn request_microphone(&self);
}

/// Gate for platforms without a per-app microphone consent model.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

impl PermissionGate for AlwaysGranted {
    fn microphone_granted(&self) -> bool {
        true
    }

    fn request_microphone(&self) {}
}
