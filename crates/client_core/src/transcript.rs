//! Append-only conversation log.

use shared::domain::ConversationEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<ConversationEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` and returns its position.
    pub fn append(&mut self, entry: ConversationEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Starts a new conversation whose only entry is `first`.
    pub fn reset_with(&mut self, first: ConversationEntry) {
        self.entries.clear();
        self.entries.push(first);
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/transcript_tests.rs"]
mod tests;
