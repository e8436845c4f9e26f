//! Device handles and the completion/error channel between platform
//! devices and the session control point.

pub mod mock;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Copyable identity of a device handle, used to address callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque reference to a bound capture or playback resource.
///
/// Not `Clone`: exactly one session owns it, and `release` consumes it.
#[derive(Debug)]
pub struct DeviceHandle {
    id: HandleId,
    path: PathBuf,
}

impl DeviceHandle {
    /// Allocate a handle with a process-unique id, bound to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            id: HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed)),
            path: path.into(),
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Asynchronous notification raised by a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Natural end of stream (playback) or device-initiated finish.
    Completed(HandleId),
    /// The device failed while running.
    Error { handle: HandleId, reason: String },
}

impl DeviceEvent {
    pub fn handle(&self) -> HandleId {
        match self {
            Self::Completed(handle) | Self::Error { handle, .. } => *handle,
        }
    }
}

/// Sending half of the device event channel.
///
/// Devices may call it from any thread; events are only applied when the
/// owner of the receiving half pumps them.
#[derive(Debug, Clone)]
pub struct DeviceEventSender {
    tx: mpsc::Sender<DeviceEvent>,
}

impl DeviceEventSender {
    pub fn completed(&self, handle: HandleId) {
        self.send(DeviceEvent::Completed(handle));
    }

    pub fn error(&self, handle: HandleId, reason: impl Into<String>) {
        self.send(DeviceEvent::Error {
            handle,
            reason: reason.into(),
        });
    }

    pub fn send(&self, event: DeviceEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Device event dropped: control point is gone");
        }
    }
}

/// Create a connected sender/receiver pair.
pub fn event_channel() -> (DeviceEventSender, mpsc::Receiver<DeviceEvent>) {
    let (tx, rx) = mpsc::channel();
    (DeviceEventSender { tx }, rx)
}
