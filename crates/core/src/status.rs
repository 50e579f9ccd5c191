//! Task status values reported by the OCR service.
//!
//! The service sends statuses as upper-case strings. The four known values
//! map onto dedicated variants; anything else is kept verbatim in
//! [`TaskStatus::Unknown`] so it can still be displayed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wire value for a queued task.
pub const STATUS_WAITING: &str = "WAITING";
/// Wire value for a task the engine is working on.
pub const STATUS_PROCESSING: &str = "PROCESSING";
/// Wire value for a finished task with a result.
pub const STATUS_SUCCESS: &str = "SUCCESS";
/// Wire value for a task that failed.
pub const STATUS_FAILED: &str = "FAILED";

/// Lifecycle state of a recognition job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// Queued; `queue_position` is meaningful.
    Waiting,
    /// Actively recognizing.
    Processing,
    /// Terminal. The result lives in the history list.
    Success,
    /// Terminal. `error_message` is populated.
    Failed,
    /// A value this client does not recognize.
    Unknown(String),
}

/// Visual state of the progress column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    Active,
    Success,
    Exception,
}

impl TaskStatus {
    /// `true` for `WAITING` and `PROCESSING`, the only states that are
    /// polled. Unknown values never keep the poller alive.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Waiting | Self::Processing)
    }

    /// `true` for `SUCCESS` and `FAILED`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Waiting => STATUS_WAITING,
            Self::Processing => STATUS_PROCESSING,
            Self::Success => STATUS_SUCCESS,
            Self::Failed => STATUS_FAILED,
            Self::Unknown(raw) => raw,
        }
    }

    /// Short human-readable label for tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Coarse progress indicator derived from the status alone.
    pub fn progress_percent(&self) -> u8 {
        match self {
            Self::Success | Self::Failed => 100,
            Self::Processing => 50,
            _ => 10,
        }
    }

    pub fn progress_state(&self) -> ProgressState {
        match self {
            Self::Failed => ProgressState::Exception,
            Self::Success => ProgressState::Success,
            _ => ProgressState::Active,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            STATUS_WAITING => Self::Waiting,
            STATUS_PROCESSING => Self::Processing,
            STATUS_SUCCESS => Self::Success,
            STATUS_FAILED => Self::Failed,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
