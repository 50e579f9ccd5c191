//! The seam between the task tracker and the transport.
//!
//! [`OcrApi`](crate::api::OcrApi) is the HTTP implementation; the tracker
//! only ever talks to `dyn OcrService`, which lets tests script responses.

use async_trait::async_trait;

use ocrdesk_core::results::OcrResult;
use ocrdesk_core::task::{CreatedTask, TaskStatusUpdate};

use crate::api::OcrApiError;
use crate::upload::UploadFile;

#[async_trait]
pub trait OcrService: Send + Sync {
    /// Submit a batch of files; one created task per file, in server order.
    async fn upload_files(&self, files: Vec<UploadFile>) -> Result<Vec<CreatedTask>, OcrApiError>;

    /// Submit an image by URL.
    async fn create_task_by_url(&self, url: &str) -> Result<CreatedTask, OcrApiError>;

    /// Current status of a single task.
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusUpdate, OcrApiError>;

    async fn list_results(&self) -> Result<Vec<OcrResult>, OcrApiError>;

    async fn delete_result(&self, id: i64) -> Result<bool, OcrApiError>;
}
