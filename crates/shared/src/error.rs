use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body the document server sends with non-success responses.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("{error}")]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Best-effort decode of an error body. Falls back to the raw text.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        if body.is_empty() {
            return None;
        }
        match serde_json::from_slice::<ApiError>(body) {
            Ok(err) => Some(err),
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                (!text.is_empty()).then(|| Self::new(text))
            }
        }
    }
}
