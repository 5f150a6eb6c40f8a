//! Chat transcript: what the user currently sees

use crate::session::{Message, Sender, SessionStore};

/// A display surface for chat messages
pub trait Transcript {
    /// Remove every displayed message
    fn clear(&mut self);

    /// Display one more message at the end
    fn push(&mut self, message: &Message);

    /// Move the viewport to the newest message
    fn scroll_to_end(&mut self);
}

/// Transcript kept in memory, drawn by a terminal front end
#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    messages: Vec<Message>,
    /// Lines scrolled up from the bottom; 0 follows the newest message
    scroll_back: usize,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    /// Keep the scroll-back within the `max` rows the renderer can show
    pub fn clamp_scroll_back(&mut self, max: usize) {
        self.scroll_back = self.scroll_back.min(max);
    }
}

impl Transcript for ChatTranscript {
    fn clear(&mut self) {
        self.messages.clear();
        self.scroll_back = 0;
    }

    fn push(&mut self, message: &Message) {
        self.messages.push(message.clone());
    }

    fn scroll_to_end(&mut self) {
        self.scroll_back = 0;
    }
}

/// Live chat: a transcript that can also record into the session store
#[derive(Debug)]
pub struct ChatView<T: Transcript> {
    store: SessionStore,
    transcript: T,
}

impl<T: Transcript> ChatView<T> {
    pub fn new(store: SessionStore, transcript: T) -> Self {
        Self { store, transcript }
    }

    /// Show a message and, when `persist` is set, append it to the current
    /// session.
    ///
    /// The message is displayed even if persisting it fails.
    pub fn append_to_transcript(
        &mut self,
        content: impl Into<String>,
        sender: Sender,
        is_image: bool,
        persist: bool,
    ) -> crate::Result<()> {
        let message = Message {
            text: content.into(),
            sender,
            is_image,
        };
        self.transcript.push(&message);
        self.transcript.scroll_to_end();

        if persist {
            self.store.append_message(message)?;
        }
        Ok(())
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn transcript(&self) -> &T {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut T {
        &mut self.transcript
    }
}
