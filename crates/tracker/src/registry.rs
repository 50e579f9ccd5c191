//! Insertion-ordered registry of submitted tasks.
//!
//! The registry is a [`tokio::sync::watch`] channel holding an
//! `Arc<Vec<OcrTask>>`. Every mutation is a single `send_modify` /
//! `send_if_modified` call, so the channel is the one source of truth:
//! readers always see the most recent commit, and subscribers are woken on
//! every change.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::watch;

use ocrdesk_core::error::CoreError;
use ocrdesk_core::task::OcrTask;

/// Immutable view of the registry at one commit.
pub type TaskSnapshot = Arc<Vec<OcrTask>>;

/// Shared, ordered collection of tasks for one console session.
///
/// Designed to be wrapped in `Arc` and shared between the poller and the
/// submission handlers.
pub struct TaskRegistry {
    tx: watch::Sender<TaskSnapshot>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self { tx }
    }

    /// Add tasks to the end of the sequence.
    ///
    /// The whole batch is rejected with [`CoreError::Conflict`] if any
    /// identifier is already registered or repeated within the batch.
    pub fn append(&self, tasks: Vec<OcrTask>) -> Result<(), CoreError> {
        if tasks.is_empty() {
            return Ok(());
        }

        let mut outcome = Ok(());
        self.tx.send_if_modified(|snapshot| {
            if let Err(e) = check_unique(snapshot.iter().chain(tasks.iter())) {
                outcome = Err(e);
                return false;
            }
            Arc::make_mut(snapshot).extend(tasks);
            true
        });
        outcome
    }

    /// Replace the whole sequence in one commit.
    pub fn replace_all(&self, tasks: Vec<OcrTask>) -> Result<(), CoreError> {
        check_unique(tasks.iter())?;
        self.tx.send_replace(Arc::new(tasks));
        Ok(())
    }

    /// Replace every task whose identifier appears in `updates`, in place.
    ///
    /// Tasks without an update keep their record and position, including
    /// any appended after the caller took its snapshot. Updates for unknown
    /// identifiers are ignored. Returns the number of tasks replaced.
    pub fn merge(&self, mut updates: HashMap<String, OcrTask>) -> usize {
        if updates.is_empty() {
            return 0;
        }

        let mut replaced = 0;
        self.tx.send_if_modified(|snapshot| {
            if !snapshot.iter().any(|t| updates.contains_key(&t.task_id)) {
                return false;
            }
            for task in Arc::make_mut(snapshot).iter_mut() {
                if let Some(updated) = updates.remove(&task.task_id) {
                    *task = updated;
                    replaced += 1;
                }
            }
            true
        });

        if !updates.is_empty() {
            tracing::debug!(
                ignored = updates.len(),
                "Dropped status updates for tasks no longer registered",
            );
        }
        replaced
    }

    /// The most recently committed sequence.
    pub fn snapshot(&self) -> TaskSnapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every future commit.
    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot> {
        self.tx.subscribe()
    }

    /// Tasks still in `WAITING` or `PROCESSING`, in registry order.
    pub fn active_tasks(&self) -> Vec<OcrTask> {
        self.tx
            .borrow()
            .iter()
            .filter(|t| t.is_active())
            .cloned()
            .collect()
    }

    pub fn has_active(&self) -> bool {
        self.tx.borrow().iter().any(OcrTask::is_active)
    }

    pub fn get(&self, task_id: &str) -> Option<OcrTask> {
        self.tx
            .borrow()
            .iter()
            .find(|t| t.task_id == task_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn check_unique<'a>(tasks: impl Iterator<Item = &'a OcrTask>) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    for task in tasks {
        if !seen.insert(task.task_id.as_str()) {
            return Err(CoreError::Conflict(format!(
                "task '{}' is already registered",
                task.task_id
            )));
        }
    }
    Ok(())
}
