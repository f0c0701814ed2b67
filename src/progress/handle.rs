//! Progress handle: one task's binding to the notification worker.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::HandleConfig;
use crate::task::TaskId;
use crate::transport::{Binding, BindingTransport, ConnectionEvent, ConnectionListener};
use crate::worker::WorkerRef;

use super::state::{ForwardKey, ProgressState};

/// Lifecycle of a [`ProgressHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Connection requested, no worker yet.
    Binding,
    /// Worker reachable; updates are forwarded.
    Connected,
    /// Worker went away; updates are kept locally.
    Disconnected,
    /// Handle released. Terminal.
    Closed,
}

impl HandleState {
    /// Check if this is the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for HandleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Binding => "binding",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

struct Inner {
    progress: ProgressState,
    last_forwarded: Option<ForwardKey>,
    worker: Option<WorkerRef>,
    lifecycle: HandleState,
}

struct Shared {
    task_id: TaskId,
    log_forwards: bool,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, next: ProgressState) {
        let mut inner = self.lock();
        let unchanged = inner.last_forwarded == Some(next.forward_key());
        inner.progress = next;

        if unchanged {
            if self.log_forwards {
                log::debug!("{}: {} unchanged, not forwarded", self.task_id, next);
            }
            return;
        }
        self.forward(&mut inner);
    }

    /// Push the current state to the worker, if one is connected.
    fn forward(&self, inner: &mut Inner) {
        let Some(worker) = inner.worker.as_ref() else {
            return;
        };
        let progress = inner.progress;
        worker.replace_progress(
            self.task_id,
            progress.progress_max(),
            progress.progress(),
            progress.is_indeterminate(),
        );
        inner.last_forwarded = Some(progress.forward_key());

        if self.log_forwards {
            log::debug!("{}: forwarded {}", self.task_id, progress);
        }
    }
}

impl ConnectionListener for Shared {
    fn on_connection_event(&self, event: ConnectionEvent) {
        let mut inner = self.lock();
        if inner.lifecycle.is_terminal() {
            log::debug!("{}: dropping {:?} after close", self.task_id, event);
            return;
        }

        match event {
            ConnectionEvent::Connected(worker) => {
                log::info!("{}: worker connected", self.task_id);
                inner.worker = Some(worker);
                inner.lifecycle = HandleState::Connected;
                self.forward(&mut inner);
            }
            ConnectionEvent::Disconnected => {
                log::info!("{}: worker disconnected", self.task_id);
                inner.worker = None;
                inner.lifecycle = HandleState::Disconnected;
            }
            ConnectionEvent::Failed(err) => {
                log::warn!("{}: {}", self.task_id, err);
                inner.worker = None;
                inner.lifecycle = HandleState::Disconnected;
            }
        }
    }
}

/// Reports one task's progress to the notification worker.
///
/// The handle binds as soon as it is created and can be updated right away,
/// from any thread; updates made before the worker connects are delivered when
/// it does. An update is forwarded only when the percent or the indeterminate
/// flag changes.
///
/// Closing (explicitly or by dropping) unbinds and removes the notification.
///
/// # Example
///
/// ```rust,ignore
/// use notify_progress::{LocalTransport, ProgressHandle, TaskId};
///
/// let handle = ProgressHandle::new(transport.clone(), TaskId::new(1));
/// handle.set_indeterminate_progress();
/// for done in 0..=total {
///     handle.set_progress(total, done);
/// }
/// handle.close();
/// ```
pub struct ProgressHandle {
    shared: Arc<Shared>,
    transport: Arc<dyn BindingTransport>,
    binding: Option<Binding>,
}

impl ProgressHandle {
    /// Create a handle for `task_id` and request a worker connection.
    pub fn new(transport: Arc<dyn BindingTransport>, task_id: TaskId) -> Self {
        Self::with_config(transport, task_id, &HandleConfig::default())
    }

    /// Create a handle with explicit settings.
    pub fn with_config(
        transport: Arc<dyn BindingTransport>,
        task_id: TaskId,
        config: &HandleConfig,
    ) -> Self {
        let shared = Arc::new(Shared {
            task_id,
            log_forwards: config.log_forwards,
            inner: Mutex::new(Inner {
                progress: ProgressState::default(),
                last_forwarded: None,
                worker: None,
                lifecycle: HandleState::Binding,
            }),
        });

        // The transport may deliver Connected before this returns.
        let binding = transport.connect(task_id, shared.clone());
        log::debug!("{}: bound as {}", task_id, binding.get());

        Self {
            shared,
            transport,
            binding: Some(binding),
        }
    }

    /// The task id.
    pub fn id(&self) -> TaskId {
        self.shared.task_id
    }

    /// Show a spinner instead of a percentage.
    pub fn set_indeterminate_progress(&self) {
        self.shared.update(ProgressState::indeterminate());
    }

    /// Report `progress` out of `progress_max` units; `progress_max == 0`
    /// means the total is unknown.
    ///
    /// Both values are narrowed to `i32` and must fit in it.
    pub fn set_progress(&self, progress_max: i64, progress: i64) {
        self.shared
            .update(ProgressState::determinate(progress_max, progress));
    }

    /// Like [`set_progress`](Self::set_progress) for fractional magnitudes,
    /// which are truncated toward zero.
    pub fn set_progress_f64(&self, progress_max: f64, progress: f64) {
        self.set_progress(progress_max as i64, progress as i64);
    }

    /// Current progress values.
    pub fn progress(&self) -> ProgressState {
        self.shared.lock().progress
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> HandleState {
        self.shared.lock().lifecycle
    }

    /// Whether updates are currently forwarded.
    pub fn is_connected(&self) -> bool {
        self.shared.lock().worker.is_some()
    }

    /// Unbind and remove the task's notification.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(binding) = self.binding.take() else {
            return;
        };

        {
            let mut inner = self.shared.lock();
            inner.lifecycle = HandleState::Closed;
            inner.worker = None;
        }

        // Outside the lock: a transport callback may be waiting on it.
        self.transport.disconnect(binding);
        self.transport.stop_task(self.shared.task_id);
        log::debug!("{}: closed", self.shared.task_id);
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ProgressHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("ProgressHandle")
            .field("task_id", &self.shared.task_id)
            .field("progress", &inner.progress)
            .field("lifecycle", &inner.lifecycle)
            .finish()
    }
}
