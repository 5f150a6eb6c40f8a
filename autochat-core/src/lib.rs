//! Core types for autochat
//!
//! This crate owns the persisted chat history (sessions of messages), the
//! storage backends it lives in, the history view that navigates it, and the
//! shared configuration and logging setup used by the other crates.

pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod session;
pub mod transcript;
pub mod utils;

pub use error::{Error, Result};
pub use history::{HistoryView, SelectOutcome, Sidebar, SidebarState};
pub use session::{
    LocalStorage, MemoryStorage, Message, NewSessionPolicy, Sender, Session, SessionCollection,
    SessionStorage, SessionStore, SessionSummary,
};
pub use transcript::{ChatTranscript, ChatView, Transcript};
