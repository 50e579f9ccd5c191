//! Client-side tracking of asynchronous OCR jobs.
//!
//! Submissions append tasks to a [`TaskRegistry`]; a [`StatusPoller`]
//! keeps polling the service for every non-terminal task and merges the
//! answers back, stopping itself once nothing is left in flight.

pub mod config;
pub mod events;
pub mod poller;
pub mod registry;
pub mod submit;
pub mod tracker;

pub use config::TrackerConfig;
pub use events::TrackerEvent;
pub use poller::{poll_once, PollerState, StatusPoller, TickOutcome};
pub use registry::{TaskRegistry, TaskSnapshot};
pub use submit::{StagedFiles, SubmitError};
pub use tracker::OcrTracker;
