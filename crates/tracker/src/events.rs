//! Notifications emitted by the tracker.
//!
//! The console turns these into user-visible notices; they carry no state
//! the registry does not already hold.

use tokio::sync::broadcast;

/// Broadcast channel capacity for tracker events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// A submission created these tasks, in registry order.
    TasksSubmitted { task_ids: Vec<String> },

    /// A submission failed; no task was created.
    SubmissionFailed { reason: String },

    /// The poll timer was armed (or re-armed).
    PollerArmed,

    /// The poll timer was disarmed.
    PollerDisarmed,

    /// A poll tick finished and its results were committed.
    TickCompleted {
        fetched: usize,
        updated: usize,
        failed: usize,
    },
}

/// Create the sender half shared by the poller and the submission handlers.
pub fn event_channel() -> broadcast::Sender<TrackerEvent> {
    let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    tx
}
