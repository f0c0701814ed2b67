//! Notification workers.
//!
//! A worker owns the user-visible notification of each task. Progress handles
//! only ever reach it through [`NotificationWorker`], so any rendering surface
//! can sit behind the trait:
//!
//! - [`ChannelWorker`] forwards every command over an MPSC channel
//! - [`ConsoleWorker`] draws one terminal progress bar per task
//!
//! # Example
//!
//! ```rust,ignore
//! use notify_progress::worker::{ChannelWorker, WorkerCommand};
//!
//! let (worker, receiver) = ChannelWorker::new();
//! // ... hand `worker` to a transport ...
//! for command in receiver.try_iter() {
//!     println!("{}", command);
//! }
//! ```

mod channel;
mod console;

pub use channel::{ChannelWorker, WorkerReceiver};
pub use console::ConsoleWorker;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::task::TaskId;

/// Shared reference to a connected worker.
pub type WorkerRef = Arc<dyn NotificationWorker>;

/// The component that renders task notifications.
///
/// Calls must not block and must not call back into the progress handle that
/// issued them: handles invoke the worker while holding their own lock.
pub trait NotificationWorker: Send + Sync {
    /// Replace the progress shown for `task_id`. Fire-and-forget.
    fn replace_progress(
        &self,
        task_id: TaskId,
        progress_max: i32,
        progress: i32,
        indeterminate: bool,
    );

    /// Remove the notification for `task_id`.
    fn stop_task(&self, task_id: TaskId);
}

/// A command received by a worker, in the order it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WorkerCommand {
    /// Progress for a task changed.
    ReplaceProgress {
        /// Task whose notification changes.
        task_id: TaskId,
        /// Total work units, 0 if unknown.
        progress_max: i32,
        /// Completed work units.
        progress: i32,
        /// Spinner mode.
        indeterminate: bool,
    },
    /// A task finished and its notification should go.
    StopTask {
        /// Task to remove.
        task_id: TaskId,
    },
}

impl WorkerCommand {
    /// The task this command concerns.
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::ReplaceProgress { task_id, .. } | Self::StopTask { task_id } => *task_id,
        }
    }
}

impl std::fmt::Display for WorkerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReplaceProgress {
                task_id,
                indeterminate: true,
                ..
            } => write!(f, "{}: working...", task_id),
            Self::ReplaceProgress {
                task_id,
                progress_max,
                progress,
                ..
            } => write!(f, "{}: {}/{}", task_id, progress, progress_max),
            Self::StopTask { task_id } => write!(f, "{}: done", task_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display() {
        let id = TaskId::new(3);
        let determinate = WorkerCommand::ReplaceProgress {
            task_id: id,
            progress_max: 100,
            progress: 42,
            indeterminate: false,
        };
        let spinner = WorkerCommand::ReplaceProgress {
            task_id: id,
            progress_max: 0,
            progress: 0,
            indeterminate: true,
        };

        assert_eq!(determinate.to_string(), "task#3: 42/100");
        assert_eq!(spinner.to_string(), "task#3: working...");
        assert_eq!(WorkerCommand::StopTask { task_id: id }.to_string(), "task#3: done");
    }

    #[test]
    fn test_command_json_shape() {
        let command = WorkerCommand::StopTask {
            task_id: TaskId::new(9),
        };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#"{"command":"stop_task","task_id":9}"#);
        assert_eq!(command.task_id(), TaskId::new(9));
    }
}
