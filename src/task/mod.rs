//! Task identifiers.
//!
//! A task id is the worker-side key of one notification. Callers may pick ids
//! themselves or draw them from a [`TaskIdAllocator`].

use std::sync::atomic::{AtomicI32, Ordering};

use serde::{Deserialize, Serialize};

/// Opaque identifier of one progress stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i32);

impl TaskId {
    /// Wrap a raw id.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for TaskId {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Hands out task ids that are unique within the allocator.
#[derive(Debug)]
pub struct TaskIdAllocator {
    next: AtomicI32,
}

impl TaskIdAllocator {
    /// Create an allocator whose first id is `first`.
    pub const fn starting_at(first: i32) -> Self {
        Self {
            next: AtomicI32::new(first),
        }
    }

    /// Take the next id.
    pub fn next_id(&self) -> TaskId {
        TaskId(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for TaskIdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

/// Process-wide allocator.
static GLOBAL: TaskIdAllocator = TaskIdAllocator::starting_at(1);

/// Take the next id from the process-wide allocator.
pub fn next_task_id() -> TaskId {
    GLOBAL.next_id()
}
