//! Generative-language API integration for autochat
//!
//! This crate provides the provider abstraction, the Gemini client, and the
//! image encoding used for inline attachments.

pub mod base;
pub mod gemini;
pub mod image;

pub use base::{send_message_to_api, ChatProvider, ChatRequest, ProviderError, ProviderResult};
pub use gemini::GeminiClient;
pub use image::{encode_file_as_base64, payload_from_data_uri, ImageData};
