//! Base trait for chat providers

use crate::image::ImageData;
use async_trait::async_trait;
use thiserror::Error;
use tracing::error;

/// Error type for provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Image error: {0}")]
    ImageError(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// What the user sends in one turn: text, an image, or both
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub text: Option<String>,
    pub image: Option<ImageData>,
}

impl ChatRequest {
    pub fn new(text: Option<String>, image: Option<ImageData>) -> Self {
        Self {
            text: text.filter(|t| !t.is_empty()),
            image,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Some(text.into()), None)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image.is_none()
    }
}

/// Trait for generative-language providers
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send one user turn and return the reply text
    async fn send(&self, request: ChatRequest) -> ProviderResult<String>;

    /// Model used for requests
    fn model(&self) -> String;
}

/// Send a turn, turning any failure into `fallback`.
///
/// The cause is logged; the caller always gets something to show.
pub async fn send_message_to_api(
    provider: &dyn ChatProvider,
    request: ChatRequest,
    fallback: &str,
) -> String {
    match provider.send(request).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Chat request failed: {}", e);
            fallback.to_string()
        }
    }
}
