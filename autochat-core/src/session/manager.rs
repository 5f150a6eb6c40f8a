//! Session store: the operations the chat performs on its history

use super::storage::SessionStorage;
use super::store::{Message, Session, SessionCollection};
use crate::utils::preview;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Default number of characters kept in a session preview
pub const DEFAULT_PREVIEW_CHARS: usize = 30;

/// When a chat start opens a fresh session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewSessionPolicy {
    /// Every start appends a new session, even after an unused one
    #[default]
    Always,
    /// Reuse the last session if nothing was ever said in it
    WhenLastNonEmpty,
}

/// A history list entry: where the session is and how it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Position of the session in the collection
    pub index: usize,
    /// Truncated first message text
    pub preview: String,
}

impl SessionSummary {
    /// Human-readable label, numbering sessions from 1
    pub fn label(&self) -> String {
        format!("Session {}: {}", self.index + 1, self.preview)
    }
}

/// Durable, ordered record of every conversation turn
///
/// Cloning is cheap; clones share the same storage.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    policy: NewSessionPolicy,
    preview_chars: usize,
}

impl SessionStore {
    /// Create a store over `storage` with default settings
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            policy: NewSessionPolicy::default(),
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    pub fn with_policy(mut self, policy: NewSessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    /// Start the session for this chat. Returns the current session index.
    pub fn initialize_session(&self) -> crate::Result<usize> {
        let policy = self.policy;
        let mut current = 0;
        self.storage.update(&mut |sessions| {
            let reuse = policy == NewSessionPolicy::WhenLastNonEmpty
                && sessions.current().is_some_and(Session::is_empty);
            current = if reuse {
                sessions.len() - 1
            } else {
                sessions.open_session()
            };
        })?;

        info!(session = current, "Session initialized");
        Ok(current)
    }

    /// Append `message` to the current session
    pub fn append_message(&self, message: Message) -> crate::Result<()> {
        debug!(
            sender = %message.sender,
            is_image = message.is_image,
            "Appending message"
        );
        let mut pending = Some(message);
        self.storage.update(&mut |sessions| {
            if let Some(message) = pending.take() {
                sessions.append_to_current(message);
            }
        })
    }

    /// The session at `index`, if there is one
    pub fn get_session(&self, index: usize) -> Option<Session> {
        self.storage.load().get(index).cloned()
    }

    /// One summary per non-empty session, keeping original indices
    pub fn list_session_summaries(&self) -> Vec<SessionSummary> {
        self.storage
            .load()
            .iter()
            .enumerate()
            .filter_map(|(index, session)| {
                session.first().map(|first| SessionSummary {
                    index,
                    preview: preview(&first.text, self.preview_chars),
                })
            })
            .collect()
    }

    /// The whole collection as currently stored
    pub fn sessions(&self) -> SessionCollection {
        self.storage.load()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("policy", &self.policy)
            .field("preview_chars", &self.preview_chars)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::storage::{LocalStorage, MemoryStorage};
    use crate::session::store::Sender;
    use tempfile::TempDir;

    fn memory_store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        (storage, store)
    }

    #[test]
    fn test_initialize_always_appends() {
        let (_, store) = memory_store();
        for expected in 1..=3 {
            store.initialize_session().unwrap();
            assert_eq!(store.sessions().len(), expected);
        }
        assert!(store.sessions().iter().all(Session::is_empty));
    }

    #[test]
    fn test_initialize_reuses_trailing_empty_session() {
        let (_, store) = memory_store();
        let store = store.with_policy(NewSessionPolicy::WhenLastNonEmpty);

        assert_eq!(store.initialize_session().unwrap(), 0);
        assert_eq!(store.initialize_session().unwrap(), 0);
        assert_eq!(store.sessions().len(), 1);

        store.append_message(Message::user("used")).unwrap();
        assert_eq!(store.initialize_session().unwrap(), 1);
        assert_eq!(store.sessions().len(), 2);
    }

    #[test]
    fn test_append_preserves_call_order() {
        let (_, store) = memory_store();
        store.initialize_session().unwrap();
        let texts = ["one", "two", "three", "four"];
        for (i, text) in texts.iter().enumerate() {
            let sender = if i % 2 == 0 { Sender::User } else { Sender::Bot };
            store.append_message(Message::text(sender, *text)).unwrap();
        }

        let session = store.get_session(0).unwrap();
        let got: Vec<&str> = session.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(got, texts);
    }

    #[test]
    fn test_append_goes_to_last_session() {
        let (_, store) = memory_store();
        store.initialize_session().unwrap();
        store.append_message(Message::user("old")).unwrap();
        store.initialize_session().unwrap();
        store.append_message(Message::user("new")).unwrap();

        assert_eq!(store.get_session(0).unwrap().len(), 1);
        assert_eq!(store.get_session(1).unwrap().first().unwrap().text, "new");
    }

    #[test]
    fn test_append_persists_degenerate_messages() {
        let (_, store) = memory_store();
        store.initialize_session().unwrap();
        store.append_message(Message::user("")).unwrap();
        assert_eq!(store.get_session(0).unwrap().len(), 1);
    }

    #[test]
    fn test_get_session_out_of_range() {
        let (_, store) = memory_store();
        assert!(store.get_session(0).is_none());
        store.initialize_session().unwrap();
        assert!(store.get_session(0).is_some());
        assert!(store.get_session(1).is_none());
    }

    #[test]
    fn test_summaries_skip_empty_sessions_without_renumbering() {
        let (_, store) = memory_store();
        store.initialize_session().unwrap();
        store.initialize_session().unwrap();
        store
            .append_message(Message::user("a question about brake pads wearing out"))
            .unwrap();
        store.initialize_session().unwrap();

        let summaries = store.list_session_summaries();
        assert_eq!(
            summaries,
            vec![SessionSummary {
                index: 1,
                preview: "a question about brake pads we...".to_string(),
            }]
        );
        assert_eq!(summaries[0].label(), "Session 2: a question about brake pads we...");
    }

    #[test]
    fn test_summary_preview_always_has_ellipsis() {
        let (_, store) = memory_store();
        store.initialize_session().unwrap();
        store.append_message(Message::user("hi")).unwrap();
        assert_eq!(store.list_session_summaries()[0].preview, "hi...");
    }

    #[test]
    fn test_summary_preview_length_is_configurable() {
        let (_, store) = memory_store();
        let store = store.with_preview_chars(5);
        store.initialize_session().unwrap();
        store.append_message(Message::bot("engine noise")).unwrap();
        assert_eq!(store.list_session_summaries()[0].preview, "engin...");
    }

    #[test]
    fn test_image_first_message_previews_data_uri() {
        let (_, store) = memory_store();
        store.initialize_session().unwrap();
        store
            .append_message(Message::image(Sender::User, "data:image/jpeg;base64,/9j/4AAQSkZJRg"))
            .unwrap();
        assert_eq!(
            store.list_session_summaries()[0].preview,
            "data:image/jpeg;base64,/9j/4AA..."
        );
    }

    #[test]
    fn test_store_over_local_storage_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(Arc::new(LocalStorage::in_dir(temp_dir.path())));
        store.initialize_session().unwrap();
        store.append_message(Message::user("Test message")).unwrap();

        let reopened = SessionStore::new(Arc::new(LocalStorage::in_dir(temp_dir.path())));
        reopened.initialize_session().unwrap();

        assert_eq!(reopened.sessions().len(), 2);
        assert_eq!(
            reopened.get_session(0).unwrap().first().unwrap().text,
            "Test message"
        );
    }
}
