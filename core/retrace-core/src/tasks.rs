//! Deferred work queue.
//!
//! Store mutations and browse interactions never perform deferred work
//! inline; they enqueue tasks that the embedder drains with [`run_pending`]
//! after the foreground call returns. Tasks run in FIFO order and never
//! reentrantly during a store mutation. All tasks are idempotent and safe
//! to run after the session that scheduled them has closed.

use std::collections::VecDeque;
use std::path::PathBuf;

use crate::session::{BrowseSession, Workbench};
use crate::store::{backup, HistoryStore};

/// One unit of deferred work.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Open a transient preview of `path`. Existence is re-checked at
    /// execution time, not scheduling time.
    OpenPreview { path: String },
    /// Copy today's history file to a dated backup and prune old ones.
    RotateBackups { history_file: PathBuf, keep: usize },
    /// Startup cleanup: prune every known project.
    PruneAll { drop_orphans: bool },
    /// Startup reset: discard the entire store.
    ClearAll,
}

/// FIFO queue of deferred tasks.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        TaskQueue::default()
    }

    pub fn schedule(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    pub fn pop(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Drains the queue, including tasks that earlier tasks schedule.
///
/// `ui` carries the active browse session and its workbench when the
/// embedder has one; preview tasks without a session are stale and are
/// dropped.
pub fn run_pending(
    queue: &mut TaskQueue,
    store: &mut HistoryStore,
    mut ui: Option<(&mut BrowseSession, &mut dyn Workbench)>,
) {
    while let Some(task) = queue.pop() {
        match task {
            Task::OpenPreview { path } => {
                if let Some((session, workbench)) = ui.as_mut() {
                    session.complete_preview(&path, store, &mut **workbench, queue);
                } else {
                    tracing::debug!(file = %path, "no browse session; dropping stale preview task");
                }
            }
            Task::RotateBackups { history_file, keep } => backup::rotate(&history_file, keep),
            Task::PruneAll { drop_orphans } => {
                if let Err(err) = store.prune_all(drop_orphans, queue) {
                    tracing::warn!(error = %err, "startup cleanup failed");
                }
            }
            Task::ClearAll => {
                if let Err(err) = store.clear_all(queue) {
                    tracing::warn!(error = %err, "startup reset failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_drain_in_fifo_order() {
        let mut queue = TaskQueue::new();
        queue.schedule(Task::ClearAll);
        queue.schedule(Task::PruneAll { drop_orphans: true });
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(Task::ClearAll));
        assert_eq!(queue.pop(), Some(Task::PruneAll { drop_orphans: true }));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }
}
