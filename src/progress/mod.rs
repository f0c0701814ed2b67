//! Task progress reporting.
//!
//! A [`ProgressHandle`] tracks one task's progress and forwards it to the
//! notification worker, coalescing updates that would not change what the
//! user sees:
//! - determinate progress is summarised as an integer percent
//! - indeterminate progress shows a spinner
//! - updates made before the worker connects are delivered on connect
//!
//! # Example
//!
//! ```rust,ignore
//! use notify_progress::progress::ProgressHandle;
//! use notify_progress::transport::LocalTransport;
//! use notify_progress::worker::ConsoleWorker;
//! use std::sync::Arc;
//!
//! let transport = Arc::new(LocalTransport::inline(Arc::new(ConsoleWorker::new())));
//! let handle = ProgressHandle::new(transport, notify_progress::task::next_task_id());
//! handle.set_progress(10, 3);
//! handle.close();
//! ```

mod handle;
mod state;

pub use handle::{HandleState, ProgressHandle};
pub use state::{percent_of, ForwardKey, ProgressState, NO_PERCENT};
