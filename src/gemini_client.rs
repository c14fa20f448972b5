use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::config::{GenerationConfig, Settings};

/// Header carrying the API key. Keeping the key out of the URL keeps it out
/// of `reqwest::Error` messages.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Reply shown to the farmer whenever the provider call fails.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I'm having trouble responding right now. Please try again in a moment.";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("API request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("response was blocked: {0}")]
    Blocked(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("response contained no text")]
    EmptyResponse,
}

/// A text-generation backend: one prompt in, one reply out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub struct GeminiClient {
    api_key: String,
    model: String,
    api_base: String,
    generation: GenerationConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            api_base: settings.api_base.clone(),
            generation: GenerationConfig::DEFAULT,
            client,
        })
    }

    fn endpoint(&self) -> Result<Url, ProviderError> {
        let base = format!("{}/models/{}:generateContent", self.api_base, self.model);
        Ok(Url::parse(&base)?)
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<String, ProviderError> {
        let request_body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [
                        {
                            "text": prompt
                        }
                    ]
                }
            ],
            "generationConfig": self.generation
        });

        debug!(model = %self.model, "Sending request to Gemini API: {}", request_body);

        let response = self
            .client
            .post(self.endpoint()?)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let response_json: Value = response.json().await?;
        debug!("Received response from Gemini API: {}", response_json);

        extract_text(&response_json)
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.generate_content(prompt).await
    }
}

/// Pulls the concatenated text of the top candidate out of a
/// `generateContent` response.
fn extract_text(response: &Value) -> Result<String, ProviderError> {
    if let Some(reason) = response
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(ProviderError::Blocked(reason.to_string()));
    }

    let candidate = response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| ProviderError::MalformedResponse("no candidates".to_string()))?;

    let parts = match candidate.pointer("/content/parts").and_then(Value::as_array) {
        Some(parts) => parts,
        None => {
            return match candidate.get("finishReason").and_then(Value::as_str) {
                Some(reason) if reason != "STOP" => Err(ProviderError::Blocked(reason.to_string())),
                _ => Err(ProviderError::MalformedResponse(
                    "candidate has no content parts".to_string(),
                )),
            };
        }
    };

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    Ok(text.to_string())
}

/// Front door to the completion provider. Never fails: provider errors are
/// logged and replaced with [`FALLBACK_REPLY`].
pub struct CompletionClient {
    provider: Box<dyn CompletionProvider>,
}

impl CompletionClient {
    pub fn new(provider: impl CompletionProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
        }
    }

    pub async fn complete(&self, prompt: &str) -> String {
        match self.provider.generate(prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                error!("Error getting AI response: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
