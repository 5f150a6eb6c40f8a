//! Chat turn handling shared by the TUI and the one-shot `send` command

use autochat_core::{ChatView, Sender, Transcript};
use autochat_providers::{
    encode_file_as_base64, send_message_to_api, ChatProvider, ChatRequest, ImageData,
    ProviderResult,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Shown at chat start; never stored
pub const WELCOME_MESSAGE: &str =
    "Hello! I'm your automotive assistant. You can send me an image for analysis.";

pub const INPUT_PLACEHOLDER: &str = "Type your question...";
pub const IMAGE_PLACEHOLDER: &str = "Image loaded. Type your question...";

/// Image attached to the next send
#[derive(Debug, Default)]
pub struct PendingImage(Option<ImageData>);

impl PendingImage {
    /// Load `path` as the pending image.
    ///
    /// On failure the previous image is dropped too.
    pub async fn load(&mut self, path: impl AsRef<Path>) -> ProviderResult<()> {
        match encode_file_as_base64(path).await {
            Ok(image) => {
                self.0 = Some(image);
                Ok(())
            }
            Err(e) => {
                self.0 = None;
                Err(e)
            }
        }
    }

    pub fn take(&mut self) -> Option<ImageData> {
        self.0.take()
    }

    pub fn is_loaded(&self) -> bool {
        self.0.is_some()
    }

    pub fn placeholder(&self) -> &'static str {
        if self.is_loaded() {
            IMAGE_PLACEHOLDER
        } else {
            INPUT_PLACEHOLDER
        }
    }
}

/// What a line typed into the chat input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Empty,
    Quit,
    AttachImage(PathBuf),
    /// 1-based session number as typed
    OpenSession(usize),
    Send(String),
    Invalid(String),
}

pub fn parse_input(input: &str) -> InputCommand {
    let input = input.trim();
    if input.is_empty() {
        return InputCommand::Empty;
    }
    if input == "/quit" {
        return InputCommand::Quit;
    }
    if let Some(path) = input.strip_prefix("/image") {
        let path = path.trim();
        if path.is_empty() {
            return InputCommand::Invalid("usage: /image <path>".to_string());
        }
        return InputCommand::AttachImage(PathBuf::from(path));
    }
    if let Some(number) = input.strip_prefix("/open") {
        return match number.trim().parse::<usize>() {
            Ok(n) if n > 0 => InputCommand::OpenSession(n),
            _ => InputCommand::Invalid("usage: /open <session number>".to_string()),
        };
    }
    InputCommand::Send(input.to_string())
}

fn record<T: Transcript>(view: &mut ChatView<T>, content: String, sender: Sender, is_image: bool) {
    if let Err(e) = view.append_to_transcript(content, sender, is_image, true) {
        error!("Failed to store message: {}", e);
    }
}

/// Run one exchange: show and store the user's image and text, ask the
/// provider, then show and store its reply.
///
/// Returns the reply, or `None` when there was nothing to send.
pub async fn handle_send<T: Transcript>(
    view: &mut ChatView<T>,
    provider: &dyn ChatProvider,
    pending: &mut PendingImage,
    input: &str,
    fallback: &str,
) -> Option<String> {
    let text = input.trim();
    if text.is_empty() && !pending.is_loaded() {
        return None;
    }

    let image = pending.take();
    if let Some(image) = &image {
        record(view, image.to_data_uri(), Sender::User, true);
    }
    if !text.is_empty() {
        record(view, text.to_string(), Sender::User, false);
    }

    info!(
        has_text = !text.is_empty(),
        has_image = image.is_some(),
        model = %provider.model(),
        "Sending chat turn"
    );
    let request = ChatRequest::new(Some(text.to_string()), image);
    let reply = send_message_to_api(provider, request, fallback).await;
    record(view, reply.clone(), Sender::Bot, false);

    Some(reply)
}
