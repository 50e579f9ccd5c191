//! Submission handlers: batch file upload and URL submission.
//!
//! Both create `WAITING` tasks, append them to the registry in one commit,
//! and arm the status poller. A single in-flight flag covers both handlers,
//! so a double-submit while a request is outstanding is rejected instead of
//! creating duplicate tasks.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use ocrdesk_client::{OcrApiError, UploadFile};
use ocrdesk_core::error::CoreError;
use ocrdesk_core::task::{OcrTask, URL_FILE_NAME_FALLBACK};

use crate::events::TrackerEvent;
use crate::tracker::OcrTracker;

/// Errors returned by the submission handlers.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// No staged files, or a blank URL. No request was made.
    #[error("Nothing to submit")]
    EmptyInput,

    /// Another submission is still waiting for the service.
    #[error("A submission is already in progress")]
    Busy,

    #[error(transparent)]
    Api(#[from] OcrApiError),

    /// The service handed back identifiers that are already tracked.
    #[error(transparent)]
    Registry(#[from] CoreError),
}

/// Files picked by the user but not yet submitted.
#[derive(Debug, Default)]
pub struct StagedFiles {
    files: Vec<UploadFile>,
}

impl StagedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, file: UploadFile) {
        self.files.push(file);
    }

    /// Read a file from disk and stage it.
    pub async fn stage_path(&mut self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = UploadFile::from_path(path).await?;
        self.stage(file);
        Ok(())
    }

    /// Remove the first staged file with this name. Returns whether one was
    /// removed.
    pub fn remove(&mut self, file_name: &str) -> bool {
        match self.files.iter().position(|f| f.file_name == file_name) {
            Some(index) => {
                self.files.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.file_name.as_str()).collect()
    }

    fn take(&mut self) -> Vec<UploadFile> {
        std::mem::take(&mut self.files)
    }
}

/// Holds the in-flight flag for the duration of one submission.
struct SubmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SubmissionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl OcrTracker {
    /// Whether a submission request is outstanding. Presentation layers use
    /// this to disable their submit controls.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Upload every staged file in one batch.
    ///
    /// The staged set is cleared whether or not the upload succeeds. On
    /// success the created tasks are appended in server order and their
    /// identifiers returned.
    pub async fn submit_files(&self, staged: &mut StagedFiles) -> Result<Vec<String>, SubmitError> {
        if staged.is_empty() {
            return Err(SubmitError::EmptyInput);
        }
        let _guard = SubmissionGuard::acquire(&self.submitting).ok_or(SubmitError::Busy)?;

        let files = staged.take();
        let staged_names: Vec<String> = files.iter().map(|f| f.file_name.clone()).collect();
        tracing::info!(count = files.len(), "Submitting file batch");

        let created = match self.service.upload_files(files).await {
            Ok(created) => created,
            Err(e) => return Err(self.report_failure(e.into())),
        };

        let tasks = created
            .into_iter()
            .enumerate()
            .map(|(index, created)| {
                let fallback = staged_names.get(index).map_or("file", String::as_str);
                OcrTask::from_created(created, fallback)
            })
            .collect();

        self.register(tasks)
    }

    /// Submit one image URL.
    ///
    /// `input` is cleared whether or not the request succeeds. A blank
    /// input issues no request.
    pub async fn submit_url(&self, input: &mut String) -> Result<Vec<String>, SubmitError> {
        if input.trim().is_empty() {
            input.clear();
            return Err(SubmitError::EmptyInput);
        }
        let _guard = SubmissionGuard::acquire(&self.submitting).ok_or(SubmitError::Busy)?;

        let raw = std::mem::take(input);
        let url = raw.trim();
        tracing::info!(url = %url, "Submitting URL");

        let created = match self.service.create_task_by_url(url).await {
            Ok(created) => created,
            Err(e) => return Err(self.report_failure(e.into())),
        };

        self.register(vec![OcrTask::from_created(created, URL_FILE_NAME_FALLBACK)])
    }

    /// Append freshly created tasks and arm the poller if any need polling.
    fn register(&self, tasks: Vec<OcrTask>) -> Result<Vec<String>, SubmitError> {
        let task_ids: Vec<String> = tasks.iter().map(|t| t.task_id.clone()).collect();
        let needs_polling = tasks.iter().any(OcrTask::is_active);

        if let Err(e) = self.registry.append(tasks) {
            return Err(self.report_failure(e.into()));
        }

        tracing::info!(count = task_ids.len(), "Tasks submitted");
        let _ = self.event_tx.send(TrackerEvent::TasksSubmitted {
            task_ids: task_ids.clone(),
        });

        if needs_polling {
            self.poller.start();
        }
        Ok(task_ids)
    }

    fn report_failure(&self, error: SubmitError) -> SubmitError {
        tracing::warn!(error = %error, "Submission failed");
        let _ = self.event_tx.send(TrackerEvent::SubmissionFailed {
            reason: error.to_string(),
        });
        error
    }
}
