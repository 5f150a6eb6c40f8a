//! Session history
//!
//! Every chat start opens a session; every message is appended to the most
//! recent one. The whole history is persisted as a single JSON value.

pub mod manager;
pub mod storage;
pub mod store;

pub use manager::{NewSessionPolicy, SessionStore, SessionSummary, DEFAULT_PREVIEW_CHARS};
pub use storage::{LocalStorage, MemoryStorage, SessionStorage, DEFAULT_STORAGE_KEY};
pub use store::{Message, Sender, Session, SessionCollection};
