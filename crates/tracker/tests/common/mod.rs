//! Scripted [`OcrService`] double shared by the tracker integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use tokio::sync::Notify;

use ocrdesk_client::{OcrApiError, OcrService, UploadFile};
use ocrdesk_core::results::OcrResult;
use ocrdesk_core::status::TaskStatus;
use ocrdesk_core::task::{CreatedTask, OcrTask, TaskStatusUpdate};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// One scripted answer to a status query.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(TaskStatusUpdate),
    /// Simulates a transport-level failure (HTTP 503).
    Unavailable,
    /// Success code but no payload.
    Empty,
}

impl Reply {
    pub fn status(status: TaskStatus) -> Self {
        Self::Status(TaskStatusUpdate {
            status,
            error_message: None,
            update_time: Some("2024-05-01 10:00:00".into()),
            queue_position: None,
        })
    }

    pub fn waiting_at(position: u32) -> Self {
        Self::Status(TaskStatusUpdate {
            status: TaskStatus::Waiting,
            error_message: None,
            update_time: None,
            queue_position: Some(position),
        })
    }

    pub fn failed(message: &str) -> Self {
        Self::Status(TaskStatusUpdate {
            status: TaskStatus::Failed,
            error_message: Some(message.into()),
            update_time: None,
            queue_position: None,
        })
    }

    fn into_result(self) -> Result<TaskStatusUpdate, OcrApiError> {
        match self {
            Self::Status(update) => Ok(update),
            Self::Unavailable => Err(OcrApiError::Http {
                status: 503,
                body: "service unavailable".into(),
            }),
            Self::Empty => Err(OcrApiError::MissingData),
        }
    }
}

#[derive(Default)]
struct Script {
    /// Per-task replies; the last reply repeats once the queue drains.
    replies: HashMap<String, VecDeque<Reply>>,
    status_calls: HashMap<String, usize>,
    upload_reply: Option<Vec<CreatedTask>>,
    url_reply: Option<CreatedTask>,
    uploads: Vec<Vec<String>>,
    urls: Vec<String>,
}

/// In-memory service whose answers are scripted per test.
#[derive(Default)]
pub struct ScriptedService {
    script: Mutex<Script>,
    /// When set, submissions park here until `release` is notified.
    gate: Option<Gate>,
}

pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A service whose submission calls block until released.
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script::default()),
            gate: Some(Gate {
                entered: Notify::new(),
                release: Notify::new(),
            }),
        })
    }

    pub fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("service was not built with gated()")
    }

    pub fn script_status(&self, task_id: &str, replies: Vec<Reply>) {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(task_id.to_string(), replies.into());
    }

    pub fn script_upload(&self, created: Vec<CreatedTask>) {
        self.script.lock().unwrap().upload_reply = Some(created);
    }

    pub fn script_url(&self, created: CreatedTask) {
        self.script.lock().unwrap().url_reply = Some(created);
    }

    pub fn status_calls(&self, task_id: &str) -> usize {
        self.script
            .lock()
            .unwrap()
            .status_calls
            .get(task_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_status_calls(&self) -> usize {
        self.script.lock().unwrap().status_calls.values().sum()
    }

    pub fn uploads(&self) -> Vec<Vec<String>> {
        self.script.lock().unwrap().uploads.clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.script.lock().unwrap().urls.clone()
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }
}

#[async_trait]
impl OcrService for ScriptedService {
    async fn upload_files(&self, files: Vec<UploadFile>) -> Result<Vec<CreatedTask>, OcrApiError> {
        self.pass_gate().await;
        let mut script = self.script.lock().unwrap();
        script
            .uploads
            .push(files.into_iter().map(|f| f.file_name).collect());
        script.upload_reply.clone().ok_or(OcrApiError::Rejected {
            code: 500,
            message: "upload failed".into(),
        })
    }

    async fn create_task_by_url(&self, url: &str) -> Result<CreatedTask, OcrApiError> {
        self.pass_gate().await;
        let mut script = self.script.lock().unwrap();
        script.urls.push(url.to_string());
        script.url_reply.clone().ok_or(OcrApiError::Rejected {
            code: 500,
            message: "url rejected".into(),
        })
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusUpdate, OcrApiError> {
        let mut script = self.script.lock().unwrap();
        *script.status_calls.entry(task_id.to_string()).or_default() += 1;

        let reply = match script.replies.get_mut(task_id) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        reply.unwrap_or(Reply::Empty).into_result()
    }

    async fn list_results(&self) -> Result<Vec<OcrResult>, OcrApiError> {
        Ok(Vec::new())
    }

    async fn delete_result(&self, _id: i64) -> Result<bool, OcrApiError> {
        Ok(true)
    }
}

pub fn created(task_id: &str, file_name: &str, queue_position: u32) -> CreatedTask {
    CreatedTask {
        task_id: task_id.into(),
        file_name: Some(file_name.into()),
        queue_position: Some(queue_position),
    }
}

pub fn task(task_id: &str, status: TaskStatus) -> OcrTask {
    OcrTask {
        task_id: task_id.into(),
        file_name: format!("{task_id}.png"),
        status,
        queue_position: 0,
        error_message: None,
        update_time: None,
    }
}
