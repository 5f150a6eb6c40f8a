//! History list and navigation into past sessions

use super::sidebar::{Sidebar, SidebarState};
use crate::session::{SessionStore, SessionSummary};
use crate::transcript::Transcript;
use tracing::{debug, warn};

/// Result of asking to show a past session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The session was replayed into the transcript
    Loaded { index: usize, messages: usize },
    /// No session at that index; nothing was changed
    NotFound { index: usize },
}

/// The clickable index of past sessions
#[derive(Debug)]
pub struct HistoryView {
    store: SessionStore,
    sidebar: Sidebar,
    entries: Vec<SessionSummary>,
}

impl HistoryView {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            sidebar: Sidebar::new(),
            entries: Vec::new(),
        }
    }

    /// Rebuild the entry list from storage, replacing whatever was shown
    pub fn render(&mut self) -> &[SessionSummary] {
        self.entries = self.store.list_session_summaries();
        debug!(entries = self.entries.len(), "History rendered");
        &self.entries
    }

    /// The entries from the last render
    pub fn entries(&self) -> &[SessionSummary] {
        &self.entries
    }

    /// Replace the transcript with the messages of session `index`.
    ///
    /// Replayed messages are only displayed, never stored again.
    pub fn select_session<T>(&self, index: usize, transcript: &mut T) -> SelectOutcome
    where
        T: Transcript + ?Sized,
    {
        let Some(session) = self.store.get_session(index) else {
            warn!(index, "Selected session does not exist");
            return SelectOutcome::NotFound { index };
        };

        transcript.clear();
        for message in session.messages() {
            transcript.push(message);
        }
        transcript.scroll_to_end();

        debug!(index, messages = session.len(), "Session replayed");
        SelectOutcome::Loaded {
            index,
            messages: session.len(),
        }
    }

    /// Select the session behind the rendered entry at `position`
    pub fn activate<T>(&self, position: usize, transcript: &mut T) -> Option<SelectOutcome>
    where
        T: Transcript + ?Sized,
    {
        let index = self.entries.get(position)?.index;
        Some(self.select_session(index, transcript))
    }

    /// Toggle the sidebar; opening it re-renders the list
    pub fn toggle_sidebar(&mut self) -> SidebarState {
        let state = self.sidebar.toggle();
        if state == SidebarState::Expanded {
            self.render();
        }
        state
    }

    pub fn sidebar(&self) -> &Sidebar {
        &self.sidebar
    }
}
