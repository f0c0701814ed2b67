//! Terminal notification worker built on indicatif.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::task::TaskId;

use super::NotificationWorker;

const BAR_TEMPLATE: &str = "{prefix:>10} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)";
const SPINNER_TEMPLATE: &str = "{prefix:>10} {spinner:.green} {msg}";
const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Renders one progress bar per task on stderr.
///
/// Indeterminate tasks are shown as spinners; stopping a task clears its bar.
pub struct ConsoleWorker {
    multi: MultiProgress,
    bars: Mutex<HashMap<TaskId, ProgressBar>>,
    hidden: bool,
}

impl ConsoleWorker {
    /// Create a worker drawing to stderr.
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr(), false)
    }

    /// Create a worker that keeps its state but draws nothing.
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden(), true)
    }

    fn with_draw_target(target: ProgressDrawTarget, hidden: bool) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: Mutex::new(HashMap::new()),
            hidden,
        }
    }

    /// Whether this worker was created with [`ConsoleWorker::hidden`].
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Number of tasks currently shown.
    pub fn active_tasks(&self) -> usize {
        self.bars().len()
    }

    /// Position and length of a task's bar, if it is shown.
    pub fn bar_state(&self, task_id: TaskId) -> Option<(u64, Option<u64>)> {
        self.bars()
            .get(&task_id)
            .map(|bar| (bar.position(), bar.length()))
    }

    fn bars(&self) -> MutexGuard<'_, HashMap<TaskId, ProgressBar>> {
        self.bars.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for ConsoleWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationWorker for ConsoleWorker {
    fn replace_progress(
        &self,
        task_id: TaskId,
        progress_max: i32,
        progress: i32,
        indeterminate: bool,
    ) {
        let mut bars = self.bars();
        let bar = bars.entry(task_id).or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new(0));
            bar.set_prefix(task_id.to_string());
            bar
        });

        if indeterminate || progress_max == 0 {
            bar.set_style(Self::spinner_style());
            bar.set_message("working...");
            bar.enable_steady_tick(SPINNER_TICK);
        } else {
            bar.disable_steady_tick();
            bar.set_style(Self::bar_style());
            bar.set_length(progress_max.max(0) as u64);
            bar.set_position(progress.max(0) as u64);
        }
    }

    fn stop_task(&self, task_id: TaskId) {
        if let Some(bar) = self.bars().remove(&task_id) {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        } else {
            log::debug!("No notification shown for {}", task_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_tracks_latest_progress() {
        let worker = ConsoleWorker::hidden();
        let id = TaskId::new(1);

        worker.replace_progress(id, 100, 10, false);
        worker.replace_progress(id, 100, 55, false);

        assert_eq!(worker.active_tasks(), 1);
        assert_eq!(worker.bar_state(id), Some((55, Some(100))));
    }

    #[test]
    fn test_stop_task_clears_bar() {
        let worker = ConsoleWorker::hidden();
        let id = TaskId::new(2);

        worker.replace_progress(id, 0, 0, true);
        assert_eq!(worker.active_tasks(), 1);

        worker.stop_task(id);
        assert_eq!(worker.active_tasks(), 0);
        assert_eq!(worker.bar_state(id), None);

        // Stopping an unknown task is harmless
        worker.stop_task(id);
    }

    #[test]
    fn test_tasks_are_independent() {
        let worker = ConsoleWorker::hidden();

        worker.replace_progress(TaskId::new(1), 10, 1, false);
        worker.replace_progress(TaskId::new(2), 20, 2, false);
        worker.stop_task(TaskId::new(1));

        assert_eq!(worker.active_tasks(), 1);
        assert_eq!(worker.bar_state(TaskId::new(2)), Some((2, Some(20))));
    }
}
