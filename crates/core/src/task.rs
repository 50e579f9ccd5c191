//! Client-side record of a submitted recognition job, plus the payloads
//! the service returns when a job is created or polled.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::status::TaskStatus;

/// Display label used when a URL submission comes back without a file name.
pub const URL_FILE_NAME_FALLBACK: &str = "URL image";

/// One submitted OCR job as tracked by the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrTask {
    pub task_id: String,
    pub file_name: String,
    pub status: TaskStatus,
    /// Only meaningful while `status` is `WAITING`.
    pub queue_position: u32,
    pub error_message: Option<String>,
    /// Server-side timestamp, kept verbatim.
    pub update_time: Option<String>,
}

/// A task identifier handed out by an upload or create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTask {
    pub task_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_position")]
    pub queue_position: Option<u32>,
}

/// Body of a successful status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdate {
    pub status: TaskStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Advisory. Non-string values are kept as their JSON text.
    #[serde(default, deserialize_with = "lenient_text")]
    pub update_time: Option<String>,
    /// Negative or non-integer values read as 0.
    #[serde(default, deserialize_with = "lenient_position")]
    pub queue_position: Option<u32>,
}

/// Accept any JSON value for a display-only text field.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

/// Accept any JSON value for a queue position; anything that is not a
/// non-negative integer in range becomes 0.
fn lenient_position<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let position = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    };
    Ok(Some(position.unwrap_or(0)))
}

impl OcrTask {
    /// Build a freshly submitted task in the `WAITING` state.
    ///
    /// `fallback_name` is used when the service did not report a file name.
    pub fn from_created(created: CreatedTask, fallback_name: &str) -> Self {
        Self {
            task_id: created.task_id,
            file_name: created
                .file_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| fallback_name.to_string()),
            status: TaskStatus::Waiting,
            queue_position: created.queue_position.unwrap_or(0),
            error_message: None,
            update_time: None,
        }
    }

    /// Apply a status query result, returning the updated record.
    ///
    /// Identity and file name are carried over; every status-related field
    /// is taken from `update`, with a missing queue position read as 0.
    pub fn merged_with(&self, update: TaskStatusUpdate) -> Self {
        Self {
            task_id: self.task_id.clone(),
            file_name: self.file_name.clone(),
            status: update.status,
            queue_position: update.queue_position.unwrap_or(0),
            error_message: update.error_message,
            update_time: update.update_time,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
