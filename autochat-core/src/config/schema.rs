//! Configuration schema definitions

use crate::session::{
    LocalStorage, NewSessionPolicy, SessionStore, DEFAULT_PREVIEW_CHARS, DEFAULT_STORAGE_KEY,
};
use crate::utils::expand_tilde;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Root configuration for autochat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Language model provider
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Session history persistence
    #[serde(default)]
    pub storage: StorageConfig,
    /// History list presentation
    #[serde(default)]
    pub history: HistoryConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Session store over the configured local storage file
    pub fn open_session_store(&self) -> SessionStore {
        let storage = LocalStorage::new(self.storage.resolved_dir(), self.storage.key.clone());
        SessionStore::new(Arc::new(storage))
            .with_policy(self.storage.new_session)
            .with_preview_chars(self.history.preview_chars)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Days to keep rotated log files
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "~/.autochat/logs".to_string()
}

fn default_retention_days() -> u64 {
    7
}

impl LoggingConfig {
    /// Log directory with `~` expanded
    pub fn resolved_dir(&self) -> PathBuf {
        expand_tilde(&self.dir)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            retention_days: default_retention_days(),
            overrides: HashMap::new(),
        }
    }
}

/// Gemini API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Instruction placed before every user question
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Reply shown when the API cannot be reached
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_system_prompt() -> String {
    "You are an assistant specialised in automotive information. Analyse the provided \
     image (if any) and answer based on it and on the user's question. Only answer \
     questions within this topic. Use bold formatting to highlight key terms. \
     User question: "
        .to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_fallback_reply() -> String {
    "[Error reaching the server. Please try again shortly.]".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            model: default_model(),
            system_prompt: default_system_prompt(),
            timeout_secs: default_timeout_secs(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

/// Where the session history is kept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the local storage file
    #[serde(default = "default_storage_dir")]
    pub dir: String,
    /// Key the session collection is stored under
    #[serde(default = "default_storage_key")]
    pub key: String,
    /// Whether every chat start opens a new session
    #[serde(default)]
    pub new_session: NewSessionPolicy,
}

fn default_storage_dir() -> String {
    "~/.autochat".to_string()
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl StorageConfig {
    /// Storage directory with `~` expanded
    pub fn resolved_dir(&self) -> PathBuf {
        expand_tilde(&self.dir)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            key: default_storage_key(),
            new_session: NewSessionPolicy::default(),
        }
    }
}

/// History list presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Characters of the first message shown in a session preview
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            preview_chars: default_preview_chars(),
        }
    }
}
