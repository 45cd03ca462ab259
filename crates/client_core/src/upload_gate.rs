//! Upload gate: decides whether the conversation view is reachable and
//! normalizes the two document trigger surfaces into one upload path.

use std::path::{Path, PathBuf};

use shared::domain::DocumentStatus;

use crate::error::UploadError;

pub const UPLOAD_READY_NOTICE: &str =
    "PDF uploaded successfully. You can now ask questions about its content.";
pub const UPLOAD_FAILURE_NOTICE: &str = "Error uploading PDF";

const FALLBACK_FILENAME: &str = "document.pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejected {
    /// Another upload has not settled yet.
    InFlight,
    /// The session already has a document.
    AlreadyUploaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    Failed,
    /// A drop that carried no files.
    NothingToUpload,
    Rejected(UploadRejected),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GatePhase {
    Settled(DocumentStatus),
    Uploading { prior: DocumentStatus },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadGate {
    phase: GatePhase,
}

impl Default for UploadGate {
    fn default() -> Self {
        Self {
            phase: GatePhase::Settled(DocumentStatus::NotUploaded),
        }
    }
}

impl UploadGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status as seen by the presentation layer. While uploading this is the
    /// status the gate had before the attempt started.
    pub fn status(&self) -> DocumentStatus {
        match self.phase {
            GatePhase::Settled(status) => status,
            GatePhase::Uploading { prior } => prior,
        }
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.phase, GatePhase::Uploading { .. })
    }

    pub fn begin(&mut self) -> Result<(), UploadRejected> {
        match self.phase {
            GatePhase::Uploading { .. } => Err(UploadRejected::InFlight),
            GatePhase::Settled(DocumentStatus::Uploaded) => Err(UploadRejected::AlreadyUploaded),
            GatePhase::Settled(prior) => {
                self.phase = GatePhase::Uploading { prior };
                Ok(())
            }
        }
    }

    pub fn settle(&mut self, succeeded: bool) -> DocumentStatus {
        let status = if succeeded {
            DocumentStatus::Uploaded
        } else {
            DocumentStatus::UploadFailed
        };
        self.phase = GatePhase::Settled(status);
        status
    }
}

/// In-memory document handed to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn read(path: &Path) -> Result<Self, UploadError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
        Ok(Self { filename, bytes })
    }

    pub fn mime_type(&self) -> &'static str {
        if self.filename.to_ascii_lowercase().ends_with(".pdf") {
            "application/pdf"
        } else {
            "application/octet-stream"
        }
    }
}

/// Where a document came from. Explicit selection and drag-and-drop behave
/// identically once normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Selected(PathBuf),
    /// Only the first dropped file is used.
    Dropped(Vec<PathBuf>),
    InMemory(DocumentFile),
}

#[derive(Debug)]
pub(crate) enum PendingDocument {
    Path(PathBuf),
    Loaded(DocumentFile),
}

impl DocumentSource {
    pub(crate) fn into_pending(self) -> Option<PendingDocument> {
        match self {
            DocumentSource::Selected(path) => Some(PendingDocument::Path(path)),
            DocumentSource::Dropped(paths) => paths.into_iter().next().map(PendingDocument::Path),
            DocumentSource::InMemory(file) => Some(PendingDocument::Loaded(file)),
        }
    }
}

impl PendingDocument {
    pub(crate) async fn load(self) -> Result<DocumentFile, UploadError> {
        match self {
            PendingDocument::Path(path) => DocumentFile::read(&path).await,
            PendingDocument::Loaded(file) => Ok(file),
        }
    }
}

#[cfg(test)]
#[path = "tests/upload_gate_tests.rs"]
mod tests;
