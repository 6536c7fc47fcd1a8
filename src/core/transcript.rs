//! Append-only conversation history.
//!
//! A [`Transcript`] is an immutable snapshot. Appending returns a new
//! snapshot and leaves the receiver untouched, so a renderer holding an older
//! value can keep reading it while the session moves on.

use std::ops::Index;
use std::sync::Arc;

use crate::core::message::Message;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Arc<[Message]>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        Self {
            messages: messages.into_iter().collect(),
        }
    }

    /// Append a user turn. Blank input is rejected and yields `None`.
    pub fn append_user(&self, text: impl Into<String>) -> Option<Transcript> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(self.appended(Message::user(text)))
    }

    /// Append an assistant turn, whether a real reply or a status line.
    pub fn append_assistant(&self, text: impl Into<String>) -> Transcript {
        self.appended(Message::assistant(text))
    }

    fn appended(&self, message: Message) -> Transcript {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.extend_from_slice(&self.messages);
        messages.push(message);
        Transcript {
            messages: messages.into(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl Index<usize> for Transcript {
    type Output = Message;

    fn index(&self, index: usize) -> &Self::Output {
        &self.messages[index]
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
