//! The `{code, message, data}` envelope every OCR service response uses.

use serde::Deserialize;

use crate::api::OcrApiError;

/// Discriminator value signalling success.
pub const CODE_SUCCESS: i32 = 200;

/// Response wrapper. Failure envelopes carry no guaranteed schema beyond
/// `code`, so everything else is optional.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i32,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == CODE_SUCCESS
    }

    /// Unwrap the payload of a successful response.
    pub fn into_data(self) -> Result<T, OcrApiError> {
        if !self.is_success() {
            return Err(OcrApiError::Rejected {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }
        self.data.ok_or(OcrApiError::MissingData)
    }
}
