//! Channel-backed notification worker.
//!
//! Every command a worker receives is sent through an MPSC channel, so the
//! actual rendering can happen on a thread of the consumer's choosing.

use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use crate::task::TaskId;

use super::{NotificationWorker, WorkerCommand};

/// Worker that publishes its commands to a channel.
///
/// # Example
///
/// ```rust,ignore
/// use notify_progress::worker::ChannelWorker;
/// use std::thread;
///
/// let (worker, receiver) = ChannelWorker::new();
///
/// thread::spawn(move || {
///     while let Ok(command) = receiver.recv() {
///         println!("{}", command);
///     }
/// });
/// ```
#[derive(Debug, Clone)]
pub struct ChannelWorker {
    sender: Sender<WorkerCommand>,
}

impl ChannelWorker {
    /// Create a worker and the receiver for its commands.
    pub fn new() -> (Self, WorkerReceiver) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, WorkerReceiver { receiver })
    }

    fn publish(&self, command: WorkerCommand) {
        // Receiver may have been dropped; the worker stays fire-and-forget.
        if self.sender.send(command).is_err() {
            log::debug!("Worker receiver dropped, discarding command");
        }
    }
}

impl NotificationWorker for ChannelWorker {
    fn replace_progress(
        &self,
        task_id: TaskId,
        progress_max: i32,
        progress: i32,
        indeterminate: bool,
    ) {
        self.publish(WorkerCommand::ReplaceProgress {
            task_id,
            progress_max,
            progress,
            indeterminate,
        });
    }

    fn stop_task(&self, task_id: TaskId) {
        self.publish(WorkerCommand::StopTask { task_id });
    }
}

/// Receiving side of a [`ChannelWorker`].
#[derive(Debug)]
pub struct WorkerReceiver {
    receiver: Receiver<WorkerCommand>,
}

impl WorkerReceiver {
    /// Block until the next command arrives.
    pub fn recv(&self) -> Result<WorkerCommand, RecvError> {
        self.receiver.recv()
    }

    /// Take a command if one is ready.
    pub fn try_recv(&self) -> Result<WorkerCommand, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Wait for a command with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<WorkerCommand, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Iterate until every worker clone is gone.
    pub fn iter(&self) -> impl Iterator<Item = WorkerCommand> + '_ {
        self.receiver.iter()
    }

    /// Non-blocking iterator over the commands received so far.
    pub fn try_iter(&self) -> impl Iterator<Item = WorkerCommand> + '_ {
        self.receiver.try_iter()
    }

    /// Collect commands until `task_id` is stopped.
    ///
    /// Blocks; returns early if every sender is dropped.
    pub fn collect_until_stopped(&self, task_id: TaskId) -> Vec<WorkerCommand> {
        let mut commands = Vec::new();
        while let Ok(command) = self.recv() {
            let stopped =
                matches!(command, WorkerCommand::StopTask { task_id: id } if id == task_id);
            commands.push(command);
            if stopped {
                break;
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_worker_publishes_in_order() {
        let (worker, receiver) = ChannelWorker::new();
        let id = TaskId::new(1);

        worker.replace_progress(id, 10, 1, false);
        worker.replace_progress(id, 0, 0, true);
        worker.stop_task(id);

        let commands: Vec<_> = receiver.try_iter().collect();
        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[0],
            WorkerCommand::ReplaceProgress {
                task_id: id,
                progress_max: 10,
                progress: 1,
                indeterminate: false,
            }
        );
        assert_eq!(commands[2], WorkerCommand::StopTask { task_id: id });
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (worker, receiver) = ChannelWorker::new();
        drop(receiver);

        // Should not panic
        worker.replace_progress(TaskId::new(1), 1, 1, false);
        worker.stop_task(TaskId::new(1));
    }

    #[test]
    fn test_collect_until_stopped() {
        let (worker, receiver) = ChannelWorker::new();
        let done = TaskId::new(2);

        let publisher = std::thread::spawn(move || {
            worker.replace_progress(TaskId::new(1), 5, 5, false);
            worker.replace_progress(done, 5, 3, false);
            worker.stop_task(done);
            worker.stop_task(TaskId::new(1));
        });

        let commands = receiver.collect_until_stopped(done);
        publisher.join().unwrap();

        assert_eq!(commands.len(), 3);
        assert_eq!(commands.last(), Some(&WorkerCommand::StopTask { task_id: done }));
        assert_eq!(receiver.try_recv().unwrap().task_id(), TaskId::new(1));
    }

    #[test]
    fn test_recv_timeout_when_idle() {
        let (_worker, receiver) = ChannelWorker::new();
        assert_eq!(
            receiver.recv_timeout(Duration::from_millis(5)),
            Err(RecvTimeoutError::Timeout)
        );
    }
}
