use reqwest::StatusCode;
use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read document '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("upload request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upload rejected with status {status}")]
    Rejected {
        status: StatusCode,
        detail: Option<ApiError>,
    },
    #[error("upload abandoned before it settled")]
    Abandoned,
}

#[derive(Debug, Error)]
pub enum QuestionError {
    #[error("question request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("question rejected with status {status}")]
    Rejected {
        status: StatusCode,
        detail: Option<ApiError>,
    },
    #[error("malformed answer payload: {0}")]
    MalformedAnswer(String),
    #[error("question abandoned before it settled")]
    Abandoned,
}

impl UploadError {
    pub fn detail(&self) -> Option<&str> {
        match self {
            UploadError::Rejected {
                detail: Some(detail),
                ..
            } => Some(detail.error.as_str()),
            _ => None,
        }
    }
}

impl QuestionError {
    pub fn detail(&self) -> Option<&str> {
        match self {
            QuestionError::Rejected {
                detail: Some(detail),
                ..
            } => Some(detail.error.as_str()),
            _ => None,
        }
    }
}
