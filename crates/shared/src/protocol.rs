use serde::{Deserialize, Serialize};

/// Multipart field the ingestion endpoint reads the document from.
pub const UPLOAD_FIELD_NAME: &str = "pdf-file";

pub fn upload_route() -> &'static str {
    "/upload"
}

pub fn chat_route() -> &'static str {
    "/chat"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadResponse {
    /// Acknowledgement text from a successful upload, when the body carries one.
    pub fn message_from_body(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<Self>(body).ok()?.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_acknowledgement_message_is_read() {
        assert_eq!(
            UploadResponse::message_from_body(br#"{"message":"File uploaded successfully"}"#)
                .as_deref(),
            Some("File uploaded successfully")
        );
    }

    #[test]
    fn upload_acknowledgement_is_optional() {
        assert_eq!(UploadResponse::message_from_body(b"{}"), None);
        assert_eq!(UploadResponse::message_from_body(b"OK"), None);
        assert_eq!(UploadResponse::message_from_body(b""), None);
    }
}
