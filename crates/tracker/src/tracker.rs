//! The console session object tying registry, poller, and service together.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use ocrdesk_client::{OcrApi, OcrApiError, OcrService};

use crate::config::TrackerConfig;
use crate::events::{event_channel, TrackerEvent};
use crate::poller::StatusPoller;
use crate::registry::{TaskRegistry, TaskSnapshot};

/// One console session: the task registry, its status poller, and the
/// service both talk to.
///
/// Submission handlers live in [`crate::submit`]. Dropping the tracker
/// disarms the poller.
pub struct OcrTracker {
    pub(crate) registry: Arc<TaskRegistry>,
    pub(crate) service: Arc<dyn OcrService>,
    pub(crate) poller: StatusPoller,
    pub(crate) event_tx: broadcast::Sender<TrackerEvent>,
    /// Set while a submission request is outstanding.
    pub(crate) submitting: AtomicBool,
}

impl OcrTracker {
    pub fn new(service: Arc<dyn OcrService>, poll_interval: Duration) -> Self {
        let registry = Arc::new(TaskRegistry::new());
        let event_tx = event_channel();
        let poller = StatusPoller::new(
            Arc::clone(&registry),
            Arc::clone(&service),
            poll_interval,
            event_tx.clone(),
        );

        Self {
            registry,
            service,
            poller,
            event_tx,
            submitting: AtomicBool::new(false),
        }
    }

    /// Build a tracker backed by the HTTP client described by `config`.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, OcrApiError> {
        let api = OcrApi::new(
            config.api_url.clone(),
            config.request_timeout,
            config.api_token.clone(),
        )?;
        Ok(Self::new(Arc::new(api), config.poll_interval))
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    pub fn service(&self) -> &Arc<dyn OcrService> {
        &self.service
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        self.registry.snapshot()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TrackerEvent> {
        self.event_tx.subscribe()
    }

    /// Disarm polling and wait for the loop to exit.
    pub async fn shutdown(&self) {
        self.poller.shutdown().await;
    }
}
