//! Question state machine: at most one question is outstanding at a time.

use crate::error::QuestionError;

pub const ANSWER_FAILURE_NOTICE: &str = "Error: Unable to get response";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionPhase {
    #[default]
    Idle,
    InFlight,
}

/// Returned when a question is submitted while another one is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Busy;

impl QuestionPhase {
    pub fn begin(&mut self) -> Result<(), Busy> {
        match self {
            QuestionPhase::InFlight => Err(Busy),
            QuestionPhase::Idle => {
                *self = QuestionPhase::InFlight;
                Ok(())
            }
        }
    }

    pub fn settle(&mut self) {
        *self = QuestionPhase::Idle;
    }

    pub fn is_pending(self) -> bool {
        self == QuestionPhase::InFlight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Answered,
    /// The round-trip failed; a notice was appended instead of an answer.
    Failed,
    /// Blank input. Nothing happened.
    Empty,
    Busy,
    DocumentNotReady,
}

/// Trimmed question text, or `None` when there is nothing to ask.
pub fn normalize_question(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Assistant entries are never blank, whichever backend produced the answer.
pub fn normalize_answer(answer: String) -> Result<String, QuestionError> {
    if answer.trim().is_empty() {
        return Err(QuestionError::MalformedAnswer(
            "answer field is empty".to_string(),
        ));
    }
    Ok(answer)
}
