//! Minimal chat-completions client for the hosted model provider.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::Config;
use crate::error::AppError;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.into()),
        }
    }

    /// User turn carrying a prompt and an inline image (`data:` URL).
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: image_url.into() },
                },
            ]),
        }
    }
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for the vision and text-generation calls.
///
/// The API key is optional at construction time; calls made without one fail
/// with [`AppError::MissingApiKey`].
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    pub(crate) vision_model: String,
    pub(crate) rewrite_model: String,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(config.model_timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("failed to build model HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
            vision_model: config.vision_model.clone(),
            rewrite_model: config.rewrite_model.clone(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends a chat completion and returns the first choice's text.
    pub async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        json_response: bool,
    ) -> Result<String, AppError> {
        let api_key = self.api_key.as_deref().ok_or(AppError::MissingApiKey)?;

        let request_body = ChatRequest {
            model,
            messages,
            max_tokens,
            response_format: json_response.then_some(ResponseFormat { kind: "json_object" }),
        };

        info!("Sending chat completion request (model {})", model);
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!("Network error calling model API: {}", e);
                AppError::ModelError(format!("failed to call model API: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!("Model API error - Status: {}, Body: {}", status, error_text);
            return Err(AppError::ModelError(format!("model API returned error status: {}", status)));
        }

        let api_response = response.json::<ChatResponse>().await.map_err(|e| {
            error!("Failed to parse model API response: {}", e);
            AppError::ModelError(format!("failed to parse model API response: {}", e))
        })?;

        match api_response.choices.into_iter().next().and_then(|choice| choice.message.content) {
            Some(content) if !content.trim().is_empty() => {
                info!("Received model response, content length: {}", content.len());
                Ok(content)
            }
            _ => {
                error!("Model API returned no usable content");
                Err(AppError::ModelError("model API returned no content".to_string()))
            }
        }
    }
}

/// Removes a surrounding Markdown code fence (```` ```json ```` / ```` ```html ```` / ```` ``` ````).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let without_open = trimmed.trim_start_matches("```");
    // Drop the info string on the opening fence line
    let body = match without_open.find('\n') {
        Some(newline) if !without_open[..newline].contains('<') && !without_open[..newline].contains('{') => {
            &without_open[newline + 1..]
        }
        _ => without_open,
    };
    body.trim().trim_end_matches("```").trim()
}
