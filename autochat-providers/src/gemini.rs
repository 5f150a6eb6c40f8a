//! Gemini generateContent client

use async_trait::async_trait;
use autochat_core::config::ProviderConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::base::{ChatProvider, ChatRequest, ProviderError, ProviderResult};
use crate::image::ImageData;

/// generateContent request body
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

/// generateContent response body
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            system_prompt: String::new(),
        }
    }

    /// Build a client from the provider section of the configuration
    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::ConfigError(
                "provider.api_key is not set (run `autochat onboard` or set GEMINI_API_KEY)"
                    .to_string(),
            ));
        }

        Ok(Self::new(
            config.api_key.clone(),
            config.api_base.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
        .with_system_prompt(config.system_prompt.clone()))
    }

    /// Text placed in front of every user question
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn build_request(&self, request: ChatRequest) -> ProviderResult<GenerateContentRequest> {
        let mut parts = Vec::new();
        if let Some(text) = request.text {
            parts.push(Part::Text {
                text: format!("{}{}", self.system_prompt, text),
            });
        }
        if let Some(ImageData { mime_type, data }) = request.image {
            parts.push(Part::InlineData {
                inline_data: InlineData { mime_type, data },
            });
        }

        if parts.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "Request must include text or an image".to_string(),
            ));
        }

        Ok(GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
        })
    }

    fn parse_response(response: GenerateContentResponse) -> ProviderResult<String> {
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("No text in the first candidate".to_string())
            })
    }

    fn api_error_message(body: &str) -> String {
        serde_json::from_str::<ErrorWrapper>(body)
            .ok()
            .and_then(|wrapper| wrapper.error.message)
            .unwrap_or_else(|| body.to_string())
    }
}

#[async_trait]
impl ChatProvider for GeminiClient {
    async fn send(&self, request: ChatRequest) -> ProviderResult<String> {
        let has_image = request.image.is_some();
        let body = self.build_request(request)?;

        debug!(model = %self.model, has_image, "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = Self::api_error_message(&error_text);
            warn!(%status, "Gemini API returned an error");
            return Err(ProviderError::ApiError(format!("HTTP {}: {}", status, message)));
        }

        let data: GenerateContentResponse = response.json().await?;
        Self::parse_response(data)
    }

    fn model(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(base: &str) -> GeminiClient {
        GeminiClient::new("test-key", base, "gemini-2.0-flash", Duration::from_secs(5))
            .with_system_prompt("Automotive only. Question: ")
    }

    #[test]
    fn test_build_request_shape() {
        let client = client("http://localhost");
        let request = ChatRequest::new(
            Some("What is this light?".to_string()),
            Some(ImageData::new("image/jpeg", "AAAA")),
        );
        let body = serde_json::to_value(client.build_request(request).unwrap()).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": "Automotive only. Question: What is this light?"},
                        {"inline_data": {"mime_type": "image/jpeg", "data": "AAAA"}}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_image_only_request_has_no_text_part() {
        let client = client("http://localhost");
        let request = ChatRequest::new(None, Some(ImageData::new("image/png", "BB")));
        let body = serde_json::to_value(client.build_request(request).unwrap()).unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].get("inline_data").is_some());
    }

    #[test]
    fn test_empty_request_is_rejected() {
        let client = client("http://localhost");
        assert!(matches!(
            client.build_request(ChatRequest::default()),
            Err(ProviderError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = client("https://example.test/v1beta/");
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = ProviderConfig::default();
        assert!(matches!(
            GeminiClient::from_config(&config),
            Err(ProviderError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_send_parses_first_candidate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{"role": "user"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"The **oil light** is on."}]}}]}"#,
            )
            .create_async()
            .await;

        let reply = client(&server.url())
            .send(ChatRequest::text("dashboard"))
            .await
            .unwrap();

        assert_eq!(reply, "The **oil light** is on.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_maps_api_error_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#,
            )
            .create_async()
            .await;

        let err = client(&server.url())
            .send(ChatRequest::text("hi"))
            .await
            .unwrap_err();

        match err {
            ProviderError::ApiError(message) => {
                assert!(message.contains("API key not valid."));
                assert!(message.contains("400"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_without_candidates_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .send(ChatRequest::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
