//! Progress Notification Library
//!
//! Client-side handles that report a long-running task's progress to a
//! notification worker, forwarding only the updates a user could actually
//! notice.
//!
//! # Features
//!
//! - **Coalescing**: updates are summarised as an integer percent plus an
//!   indeterminate flag, and forwarded only when that pair changes
//! - **Connection-aware**: handles are usable before the worker connects and
//!   re-synchronise it on every (re)connect
//! - **Thread-safe**: setters and connection callbacks may race freely
//! - **Scoped**: dropping a handle unbinds it and removes its notification
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use notify_progress::{ConsoleWorker, LocalTransport, ProgressHandle};
//! use std::sync::Arc;
//!
//! // Host a worker that draws terminal progress bars
//! let transport = Arc::new(LocalTransport::inline(Arc::new(ConsoleWorker::new())));
//!
//! // One handle per task
//! let handle = ProgressHandle::new(transport, notify_progress::task::next_task_id());
//! handle.set_indeterminate_progress();
//! for done in 0..=total {
//!     handle.set_progress(total, done);
//! }
//! handle.close();
//! ```
//!
//! # Custom Workers and Transports
//!
//! Implement [`NotificationWorker`] to render notifications elsewhere, and
//! [`BindingTransport`] to reach a worker living in another component.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod error;
pub mod progress;
pub mod task;
pub mod transport;
pub mod worker;

// Re-export commonly used types
pub use config::{AppConfig, Delivery, DemoConfig, HandleConfig, TransportConfig};
pub use error::{NotifyError, Result};
pub use progress::{HandleState, ProgressHandle, ProgressState};
pub use task::{TaskId, TaskIdAllocator};
pub use transport::{Binding, BindingTransport, ConnectionEvent, ConnectionListener, LocalTransport};
pub use worker::{ChannelWorker, ConsoleWorker, NotificationWorker, WorkerCommand, WorkerRef};

/// Library version information.
pub mod version {
    /// Library version string.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Library name.
    pub const NAME: &str = env!("CARGO_PKG_NAME");

    /// Get full version string.
    pub fn full_version() -> String {
        format!("{} {}", NAME, VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_full_version() {
        assert!(version::full_version().starts_with("notify_progress "));
    }

    #[test]
    fn test_scenario_through_public_api() {
        let (worker, receiver) = ChannelWorker::new();
        let transport = Arc::new(LocalTransport::new(
            Arc::new(worker),
            TransportConfig {
                auto_create: false,
                delivery: Delivery::Inline,
            },
        ));
        let id = TaskIdAllocator::starting_at(100).next_id();

        let handle = ProgressHandle::new(transport.clone(), id);
        handle.set_progress(100, 10);
        transport.start_worker();
        handle.set_progress(100, 10);
        handle.set_progress(100, 11);
        handle.close();

        let commands: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            commands,
            vec![
                WorkerCommand::ReplaceProgress {
                    task_id: id,
                    progress_max: 100,
                    progress: 10,
                    indeterminate: false,
                },
                WorkerCommand::ReplaceProgress {
                    task_id: id,
                    progress_max: 100,
                    progress: 11,
                    indeterminate: false,
                },
                WorkerCommand::StopTask { task_id: id },
            ]
        );
    }
}
