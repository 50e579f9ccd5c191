//! OCR service REST client library.
//!
//! Provides the response envelope, a reqwest-backed HTTP client, upload
//! payloads, and the [`OcrService`] trait the task tracker is written
//! against.

pub mod api;
pub mod envelope;
pub mod service;
pub mod upload;

pub use api::{OcrApi, OcrApiError};
pub use service::OcrService;
pub use upload::UploadFile;
