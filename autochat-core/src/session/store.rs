//! Session data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chat turn
///
/// `text` holds either plain text or, when `is_image` is set, an image
/// encoded as a data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    #[serde(rename = "isImage", default)]
    pub is_image: bool,
}

impl Message {
    /// Create a text message
    pub fn text(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender,
            is_image: false,
        }
    }

    /// Create an image message from a data URI
    pub fn image(sender: Sender, data_uri: impl Into<String>) -> Self {
        Self {
            text: data_uri.into(),
            sender,
            is_image: true,
        }
    }

    /// Create a user text message
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Sender::User, text)
    }

    /// Create a bot text message
    pub fn bot(text: impl Into<String>) -> Self {
        Self::text(Sender::Bot, text)
    }
}

/// A conversation: messages in the order they were appended
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    messages: Vec<Message>,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the end of the session
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn first(&self) -> Option<&Message> {
        self.messages.first()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<Vec<Message>> for Session {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// Every session ever started, oldest first
///
/// The last session is the current one; new messages always go there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCollection {
    sessions: Vec<Session>,
}

impl SessionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new empty session, which becomes the current one.
    /// Returns its index.
    pub fn open_session(&mut self) -> usize {
        self.sessions.push(Session::new());
        self.sessions.len() - 1
    }

    /// The session new messages are appended to
    pub fn current(&self) -> Option<&Session> {
        self.sessions.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Session> {
        self.sessions.last_mut()
    }

    /// Index of the current session
    pub fn current_index(&self) -> Option<usize> {
        self.sessions.len().checked_sub(1)
    }

    /// Append a message to the current session, opening one first if the
    /// collection is empty.
    pub fn append_to_current(&mut self, message: Message) {
        if self.sessions.is_empty() {
            self.open_session();
        }
        if let Some(session) = self.current_mut() {
            session.push(message);
        }
    }

    pub fn get(&self, index: usize) -> Option<&Session> {
        self.sessions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl From<Vec<Session>> for SessionCollection {
    fn from(sessions: Vec<Session>) -> Self {
        Self { sessions }
    }
}
