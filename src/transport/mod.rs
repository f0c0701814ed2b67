//! Binding transport between progress handles and their notification worker.
//!
//! The transport establishes connections asynchronously and reports their
//! lifecycle as [`ConnectionEvent`]s to a [`ConnectionListener`]. It is also
//! the route for stopping a task, which must work even when the handle no
//! longer holds a live worker reference.

mod local;

pub use local::LocalTransport;

use std::sync::Arc;

use crate::error::NotifyError;
use crate::task::TaskId;
use crate::worker::WorkerRef;

/// Connection lifecycle event delivered by a transport.
#[derive(Clone)]
pub enum ConnectionEvent {
    /// The worker is reachable through the given reference.
    Connected(WorkerRef),
    /// The worker went away (for example it was stopped or restarted).
    Disconnected,
    /// The connection could not be made or broke unexpectedly.
    Failed(NotifyError),
}

impl std::fmt::Debug for ConnectionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected(_) => f.write_str("Connected"),
            Self::Disconnected => f.write_str("Disconnected"),
            Self::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
        }
    }
}

/// Receiver of connection events. Called from arbitrary threads.
pub trait ConnectionListener: Send + Sync {
    /// Handle one connection event.
    fn on_connection_event(&self, event: ConnectionEvent);
}

/// Token identifying one `connect` call, returned to `disconnect` it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding(u64);

impl Binding {
    /// Wrap a transport-assigned binding number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The binding number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Platform facility for binding to the notification worker.
pub trait BindingTransport: Send + Sync {
    /// Request a connection for `task_id`. Must not block; the outcome is
    /// delivered to `listener` later, possibly from another thread.
    fn connect(&self, task_id: TaskId, listener: Arc<dyn ConnectionListener>) -> Binding;

    /// Release a binding. No further events are delivered for it once this
    /// returns, apart from ones already in flight.
    fn disconnect(&self, binding: Binding);

    /// Ask the worker to remove the notification for `task_id`.
    fn stop_task(&self, task_id: TaskId);
}
