//! HTTP boundary to the document server.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    error::ApiError,
    protocol::{
        chat_route, upload_route, AskRequest, AskResponse, UploadResponse, UPLOAD_FIELD_NAME,
    },
};
use tracing::{debug, info};

use crate::{
    error::{QuestionError, UploadError},
    upload_gate::DocumentFile,
};

/// The two round-trips a session depends on. Each call resolves exactly once.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn upload(&self, document: DocumentFile) -> Result<(), UploadError>;
    async fn ask(&self, question: &str) -> Result<String, QuestionError>;
}

pub struct HttpDocumentBackend {
    http: Client,
    server_url: String,
}

impl HttpDocumentBackend {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self { http, server_url }
    }
}

async fn error_detail(response: Response) -> Option<ApiError> {
    let body = response.bytes().await.ok()?;
    ApiError::from_body(&body)
}

#[async_trait]
impl DocumentBackend for HttpDocumentBackend {
    async fn upload(&self, document: DocumentFile) -> Result<(), UploadError> {
        let mime_type = document.mime_type();
        let size_bytes = document.bytes.len();
        let part = Part::bytes(document.bytes)
            .file_name(document.filename.clone())
            .mime_str(mime_type)?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        debug!(filename = %document.filename, size_bytes, "uploading document");
        let response = self
            .http
            .post(format!("{}{}", self.server_url, upload_route()))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Rejected {
                status,
                detail: error_detail(response).await,
            });
        }

        // Any 2xx counts; the acknowledgement body is informational.
        let body = response.bytes().await.unwrap_or_default();
        match UploadResponse::message_from_body(&body) {
            Some(message) => info!(%message, "server acknowledged upload"),
            None => debug!(%status, "upload accepted without acknowledgement message"),
        }
        Ok(())
    }

    async fn ask(&self, question: &str) -> Result<String, QuestionError> {
        debug!(question_len = question.len(), "sending question");
        let response = self
            .http
            .post(format!("{}{}", self.server_url, chat_route()))
            .json(&AskRequest {
                question: question.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuestionError::Rejected {
                status,
                detail: error_detail(response).await,
            });
        }

        let body = response.bytes().await?;
        let parsed: AskResponse = serde_json::from_slice(&body)
            .map_err(|e| QuestionError::MalformedAnswer(e.to_string()))?;
        Ok(parsed.answer)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
