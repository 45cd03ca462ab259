use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use shared::domain::{ConversationEntry, DocumentStatus};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod error;
pub mod orchestrator;
pub mod transcript;
pub mod transport;
pub mod upload_gate;

pub use error::{QuestionError, UploadError};
pub use orchestrator::{SubmitOutcome, ANSWER_FAILURE_NOTICE};
pub use transcript::Transcript;
pub use transport::{DocumentBackend, HttpDocumentBackend};
pub use upload_gate::{
    DocumentFile, DocumentSource, UploadOutcome, UploadRejected, UPLOAD_FAILURE_NOTICE,
    UPLOAD_READY_NOTICE,
};

use orchestrator::{normalize_answer, normalize_question, QuestionPhase};
use upload_gate::UploadGate;

/// Published once a mutation has been applied, before the state lock is
/// released.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    DocumentStatusChanged {
        status: DocumentStatus,
        uploading: bool,
    },
    UploadFailed {
        notice: String,
    },
    TranscriptReset {
        entries: Vec<ConversationEntry>,
    },
    EntryAppended {
        index: usize,
        entry: ConversationEntry,
    },
    /// The question was accepted; the input buffer should be emptied.
    InputCleared,
    PendingChanged(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub document_status: DocumentStatus,
    pub uploading: bool,
    pub pending: bool,
    pub transcript: Vec<ConversationEntry>,
}

impl SessionSnapshot {
    pub fn conversation_visible(&self) -> bool {
        self.document_status.is_ready()
    }
}

#[derive(Default)]
struct SessionState {
    gate: UploadGate,
    transcript: Transcript,
    question: QuestionPhase,
}

/// One upload-then-converse session. Owns the transcript; everything else
/// reads snapshots or listens to [`SessionEvent`]s.
pub struct Session {
    backend: Arc<dyn DocumentBackend>,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            backend,
            state: Mutex::new(SessionState::default()),
            events,
        })
    }

    pub fn connect(server_url: impl Into<String>) -> Arc<Self> {
        Self::new(Arc::new(HttpDocumentBackend::new(server_url)))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock_state();
        SessionSnapshot {
            document_status: state.gate.status(),
            uploading: state.gate.is_uploading(),
            pending: state.question.is_pending(),
            transcript: state.transcript.entries().to_vec(),
        }
    }

    pub fn document_status(&self) -> DocumentStatus {
        self.lock_state().gate.status()
    }

    pub fn is_pending(&self) -> bool {
        self.lock_state().question.is_pending()
    }

    pub fn transcript(&self) -> Vec<ConversationEntry> {
        self.lock_state().transcript.entries().to_vec()
    }

    pub async fn submit_document(&self, source: DocumentSource) -> UploadOutcome {
        let Some(pending) = source.into_pending() else {
            debug!("document drop carried no files");
            return UploadOutcome::NothingToUpload;
        };

        {
            let mut state = self.lock_state();
            if let Err(rejected) = state.gate.begin() {
                warn!(?rejected, "document upload rejected");
                return UploadOutcome::Rejected(rejected);
            }
            self.publish(SessionEvent::DocumentStatusChanged {
                status: state.gate.status(),
                uploading: true,
            });
        }
        let attempt = UploadAttempt::new(self);

        let result = match pending.load().await {
            Ok(document) => self.backend.upload(document).await,
            Err(err) => Err(err),
        };
        attempt.settle(result)
    }

    pub async fn submit_question(&self, text: &str) -> SubmitOutcome {
        let Some(question) = normalize_question(text) else {
            return SubmitOutcome::Empty;
        };

        {
            let mut state = self.lock_state();
            if !state.gate.status().is_ready() {
                return SubmitOutcome::DocumentNotReady;
            }
            if state.question.begin().is_err() {
                debug!("question submitted while another is outstanding");
                return SubmitOutcome::Busy;
            }
            let entry = ConversationEntry::user(question);
            let index = state.transcript.append(entry.clone());
            self.publish(SessionEvent::EntryAppended { index, entry });
            self.publish(SessionEvent::InputCleared);
            self.publish(SessionEvent::PendingChanged(true));
        }
        let attempt = QuestionAttempt::new(self);

        let result = self.backend.ask(question).await;
        attempt.settle(result)
    }

    // Events go out while the state guard is held, so subscribers see
    // mutations in the order they were applied.
    fn finish_upload(&self, result: Result<(), UploadError>) -> UploadOutcome {
        let mut state = self.lock_state();
        match result {
            Ok(()) => {
                state.gate.settle(true);
                state
                    .transcript
                    .reset_with(ConversationEntry::system(UPLOAD_READY_NOTICE));
                info!("document uploaded");
                self.publish(SessionEvent::DocumentStatusChanged {
                    status: DocumentStatus::Uploaded,
                    uploading: false,
                });
                self.publish(SessionEvent::TranscriptReset {
                    entries: state.transcript.entries().to_vec(),
                });
                UploadOutcome::Uploaded
            }
            Err(err) => {
                state.gate.settle(false);
                warn!(error = %err, detail = ?err.detail(), "document upload failed");
                self.publish(SessionEvent::DocumentStatusChanged {
                    status: DocumentStatus::UploadFailed,
                    uploading: false,
                });
                self.publish(SessionEvent::UploadFailed {
                    notice: UPLOAD_FAILURE_NOTICE.to_string(),
                });
                UploadOutcome::Failed
            }
        }
    }

    fn finish_question(&self, result: Result<String, QuestionError>) -> SubmitOutcome {
        let (entry, outcome) = match result.and_then(normalize_answer) {
            Ok(answer) => {
                info!(answer_len = answer.len(), "answer received");
                (ConversationEntry::assistant(answer), SubmitOutcome::Answered)
            }
            Err(err) => {
                warn!(error = %err, detail = ?err.detail(), "question failed");
                (
                    ConversationEntry::system(ANSWER_FAILURE_NOTICE),
                    SubmitOutcome::Failed,
                )
            }
        };

        let mut state = self.lock_state();
        let index = state.transcript.append(entry.clone());
        state.question.settle();
        self.publish(SessionEvent::EntryAppended { index, entry });
        self.publish(SessionEvent::PendingChanged(false));
        outcome
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// Settles an upload exactly once. If the driving future is dropped or
/// panics before a result arrives, the attempt counts as failed.
struct UploadAttempt<'a> {
    session: &'a Session,
    settled: bool,
}

impl<'a> UploadAttempt<'a> {
    fn new(session: &'a Session) -> Self {
        Self {
            session,
            settled: false,
        }
    }

    fn settle(mut self, result: Result<(), UploadError>) -> UploadOutcome {
        self.settled = true;
        self.session.finish_upload(result)
    }
}

impl Drop for UploadAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.settled = true;
            let _ = self.session.finish_upload(Err(UploadError::Abandoned));
        }
    }
}

/// Same contract as [`UploadAttempt`] for the question round-trip: the
/// session always returns to idle.
struct QuestionAttempt<'a> {
    session: &'a Session,
    settled: bool,
}

impl<'a> QuestionAttempt<'a> {
    fn new(session: &'a Session) -> Self {
        Self {
            session,
            settled: false,
        }
    }

    fn settle(mut self, result: Result<String, QuestionError>) -> SubmitOutcome {
        self.settled = true;
        self.session.finish_question(result)
    }
}

impl Drop for QuestionAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.settled = true;
            let _ = self.session.finish_question(Err(QuestionError::Abandoned));
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
