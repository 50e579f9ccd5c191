//! REST client for the OCR service HTTP endpoints.
//!
//! Wraps task creation (batch upload, by URL), status queries, and the
//! result history endpoints using [`reqwest`]. Every response body is an
//! [`ApiEnvelope`]; a non-200 discriminator surfaces as
//! [`OcrApiError::Rejected`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

use ocrdesk_core::results::OcrResult;
use ocrdesk_core::task::{CreatedTask, TaskStatusUpdate};

use crate::envelope::ApiEnvelope;
use crate::service::OcrService;
use crate::upload::UploadFile;

/// Errors from the OCR REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum OcrApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body
    /// decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("OCR API error ({status}): {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The envelope discriminator reported failure.
    #[error("OCR service rejected the request (code {code}): {message}")]
    Rejected { code: i32, message: String },

    /// A success envelope arrived without a payload.
    #[error("OCR service returned no data")]
    MissingData,

    /// The configured base URL cannot carry endpoint paths.
    #[error("Invalid OCR API URL: {0}")]
    InvalidUrl(String),
}

/// HTTP client for one OCR service deployment.
pub struct OcrApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl OcrApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8101`. A trailing
    ///   slash is ignored.
    /// * `timeout` - Applied to every request.
    /// * `token`   - Optional bearer token.
    pub fn new(
        api_url: impl Into<String>,
        timeout: Duration,
        token: Option<String>,
    ) -> Result<Self, OcrApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url, token))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_url,
            token,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Upload several files in one multipart request (`files` parts).
    pub async fn upload_files(
        &self,
        files: Vec<UploadFile>,
    ) -> Result<Vec<CreatedTask>, OcrApiError> {
        let form = files
            .into_iter()
            .fold(Form::new(), |form, file| form.part("files", file.into_part()));

        let response = self
            .request(Method::POST, &["api", "ocr", "uploadFiles"])?
            .multipart(form)
            .send()
            .await?;

        Self::parse_envelope(response).await
    }

    /// Create a task for an image the service downloads itself.
    pub async fn create_task_by_url(&self, url: &str) -> Result<CreatedTask, OcrApiError> {
        let response = self
            .request(Method::POST, &["api", "ocr", "createTaskByUrl"])?
            .query(&[("url", url)])
            .send()
            .await?;

        Self::parse_envelope(response).await
    }

    /// Query the current status of one task.
    pub async fn task_status(&self, task_id: &str) -> Result<TaskStatusUpdate, OcrApiError> {
        let response = self
            .request(Method::GET, &["api", "ocr", "task", "status", task_id])?
            .send()
            .await?;

        Self::parse_envelope(response).await
    }

    /// All stored results of the current user. A success envelope without
    /// data reads as an empty history.
    pub async fn list_results(&self) -> Result<Vec<OcrResult>, OcrApiError> {
        let response = self
            .request(Method::GET, &["api", "ocr", "getUserResults"])?
            .send()
            .await?;

        match Self::parse_envelope(response).await {
            Err(OcrApiError::MissingData) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Delete one stored result. Returns the service's confirmation flag.
    pub async fn delete_result(&self, id: i64) -> Result<bool, OcrApiError> {
        let id = id.to_string();
        let response = self
            .request(Method::DELETE, &["api", "ocr", "deleteById", id.as_str()])?
            .send()
            .await?;

        Self::parse_envelope(response).await
    }

    // ---- private helpers ----

    /// Base URL with `segments` appended, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, OcrApiError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| OcrApiError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|()| OcrApiError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, OcrApiError> {
        let builder = self.client.request(method, self.endpoint(segments)?);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Ensure the response has a success status code, returning an
    /// [`OcrApiError::Http`] with the body text otherwise.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, OcrApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OcrApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Decode the envelope of a successful response and unwrap its payload.
    async fn parse_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, OcrApiError> {
        let response = Self::ensure_success(response).await?;
        let envelope = response.json::<ApiEnvelope<T>>().await?;
        envelope.into_data()
    }
}

#[async_trait]
impl OcrService for OcrApi {
    async fn upload_files(&self, files: Vec<UploadFile>) -> Result<Vec<CreatedTask>, OcrApiError> {
        OcrApi::upload_files(self, files).await
    }

    async fn create_task_by_url(&self, url: &str) -> Result<CreatedTask, OcrApiError> {
        OcrApi::create_task_by_url(self, url).await
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusUpdate, OcrApiError> {
        OcrApi::task_status(self, task_id).await
    }

    async fn list_results(&self) -> Result<Vec<OcrResult>, OcrApiError> {
        OcrApi::list_results(self).await
    }

    async fn delete_result(&self, id: i64) -> Result<bool, OcrApiError> {
        OcrApi::delete_result(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let api = OcrApi::with_client(reqwest::Client::new(), "http://ocr.local:8101/", None);
        assert_eq!(api.api_url(), "http://ocr.local:8101");
    }

    #[test]
    fn task_id_is_encoded_as_one_path_segment() {
        let api = OcrApi::with_client(reqwest::Client::new(), "http://ocr.local:8101", None);
        let url = api
            .endpoint(&["api", "ocr", "task", "status", "a/b?c#d"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://ocr.local:8101/api/ocr/task/status/a%2Fb%3Fc%23d"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let api = OcrApi::with_client(reqwest::Client::new(), "https://gw.example.com/ocr-svc/", None);
        let url = api.endpoint(&["api", "ocr", "getUserResults"]).unwrap();
        assert_eq!(url.as_str(), "https://gw.example.com/ocr-svc/api/ocr/getUserResults");
    }

    #[test]
    fn malformed_base_url_is_an_error() {
        let api = OcrApi::with_client(reqwest::Client::new(), "not a url", None);
        assert_matches!(api.endpoint(&["api"]), Err(OcrApiError::InvalidUrl(_)));
    }
}
