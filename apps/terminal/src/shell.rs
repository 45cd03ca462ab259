//! Plain-text presentation of a session: the upload gate before a document
//! is ready, the conversation after.

use std::path::PathBuf;

use client_core::{SessionEvent, SessionSnapshot};
use shared::domain::{ConversationEntry, DocumentStatus, Role};

pub const TITLE: &str = "PDF Chat Bot";
pub const LOADING_INDICATOR: &str = "  . . .";
pub const HELP: &str = "\
commands:
  /open <path>        choose a PDF file
  /drop <path>...     drop files (the first one is used)
  /transcript         redraw the conversation
  /help               show this help
  /quit               exit
anything else is sent as a question once a document is uploaded;
start a question with // to send a leading / literally";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Open(PathBuf),
    Drop(Vec<PathBuf>),
    Transcript,
    Help,
    Quit,
    Ask(String),
    Usage(&'static str),
}

pub fn parse_command(line: &str) -> ShellCommand {
    let trimmed = line.trim();
    if let Some(literal) = trimmed.strip_prefix("//") {
        return ShellCommand::Ask(format!("/{literal}"));
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return ShellCommand::Ask(line.to_string());
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    match name {
        "open" if args.is_empty() => ShellCommand::Usage("usage: /open <path>"),
        "open" => ShellCommand::Open(PathBuf::from(args)),
        "drop" => ShellCommand::Drop(args.split_whitespace().map(PathBuf::from).collect()),
        "transcript" => ShellCommand::Transcript,
        "help" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        _ => ShellCommand::Ask(line.to_string()),
    }
}

pub fn render(snapshot: &SessionSnapshot) -> String {
    if snapshot.conversation_visible() {
        render_conversation(&snapshot.transcript, snapshot.pending)
    } else {
        render_upload_gate(snapshot)
    }
}

fn render_upload_gate(snapshot: &SessionSnapshot) -> String {
    let mut lines = vec![
        TITLE.to_string(),
        String::new(),
        "Choose a PDF with /open <path>, or drag it in with /drop <path>".to_string(),
    ];
    if snapshot.uploading {
        lines.push("Uploading document...".to_string());
    } else if snapshot.document_status == DocumentStatus::UploadFailed {
        lines.push("The last upload failed. Try again.".to_string());
    }
    lines.join("\n")
}

fn render_conversation(entries: &[ConversationEntry], pending: bool) -> String {
    let mut lines = vec![TITLE.to_string(), String::new()];
    lines.extend(entries.iter().map(render_entry));
    if pending {
        lines.push(LOADING_INDICATOR.to_string());
    }
    lines.join("\n")
}

pub fn render_entry(entry: &ConversationEntry) -> String {
    match entry.role() {
        Role::User | Role::Assistant => {
            format!("{}: {}", entry.role().label(), entry.content())
        }
        Role::System => format!("-- {} --", entry.content()),
    }
}

/// Incremental redraw for one event, if it changes anything visible.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::DocumentStatusChanged {
            uploading: true, ..
        } => Some("Uploading document...".to_string()),
        SessionEvent::DocumentStatusChanged { .. } => None,
        SessionEvent::UploadFailed { notice } => Some(format!("! {notice}")),
        SessionEvent::TranscriptReset { entries } => Some(render_conversation(entries, false)),
        SessionEvent::EntryAppended { entry, .. } => Some(render_entry(entry)),
        SessionEvent::PendingChanged(true) => Some(LOADING_INDICATOR.to_string()),
        SessionEvent::PendingChanged(false) | SessionEvent::InputCleared => None,
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
