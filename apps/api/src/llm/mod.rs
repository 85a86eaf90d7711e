//! The single point of entry for all chat-completion calls.
//!
//! ARCHITECTURAL RULE: No other module may call the provider API directly.
//! All LLM interactions MUST go through this module.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod catalog;
pub mod handlers;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Fallback model when the caller does not override one.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";
/// Hard cap on requested output tokens, regardless of what the caller asks for.
pub const MAX_OUTPUT_TOKENS: u32 = 16000;
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.2;
/// Fixed seed sent with every request to bias toward reproducible scoring.
/// Not all providers honor it; best-effort only.
const SEED: u64 = 42;
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Provider unavailable after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Caller-supplied generation knobs, all optional.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub include_reasoning: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<ReasoningHint>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ReasoningHint {
    effort: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    model: Option<String>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Raw text of the first choice plus provider metadata.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// A single model entry as advertised by the provider's `/models` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderModel {
    pub id: String,
    pub name: Option<String>,
    pub context_length: Option<u32>,
    pub pricing: Option<ModelPricing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelPricing {
    pub prompt: Option<String>,
    pub completion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ProviderModel>,
}

/// The single gateway used for all provider calls.
/// Wraps an OpenRouter-style chat-completion API with bounded retries.
#[derive(Clone)]
pub struct LlmGateway {
    client: Client,
    base_url: String,
    api_key: String,
    default_model: String,
}

impl LlmGateway {
    pub fn new(base_url: String, api_key: String, default_model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
            default_model,
        }
    }

    /// Sends one chat-completion request and returns the raw text of the first
    /// choice. Retries on 429/5xx/transport failures with exponential backoff;
    /// other 4xx errors fail immediately with the upstream message attached.
    pub async fn complete(
        &self,
        prompt: &str,
        system: &str,
        params: &GenerationParams,
    ) -> Result<Completion, LlmError> {
        let model = params.model.as_deref().unwrap_or(&self.default_model);
        let request_body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: clamp_temperature(params.temperature),
            max_tokens: cap_max_tokens(params.max_tokens),
            seed: SEED,
            reasoning: params
                .include_reasoning
                .then_some(ReasoningHint { effort: "medium" }),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ProviderError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let chat: ChatResponse = response.json().await?;

            let text = chat
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|t| !t.trim().is_empty())
                .ok_or(LlmError::EmptyContent)?;

            if let Some(usage) = &chat.usage {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return Ok(Completion {
                text,
                model: chat.model.unwrap_or_else(|| model.to_string()),
                usage: chat.usage,
            });
        }

        Err(last_error.unwrap_or(LlmError::Exhausted {
            attempts: MAX_ATTEMPTS,
        }))
    }
}

/// Fetches the provider's full model listing. Behind a trait so the catalog
/// cache can be tested with a counting fake.
#[async_trait]
pub trait ModelFetcher: Send + Sync {
    async fn fetch_models(&self) -> Result<Vec<ProviderModel>, LlmError>;
}

#[async_trait]
impl ModelFetcher for LlmGateway {
    async fn fetch_models(&self) -> Result<Vec<ProviderModel>, LlmError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let listing: ModelsResponse = response.json().await?;
        Ok(listing.data)
    }
}

fn clamp_temperature(requested: Option<f32>) -> f32 {
    requested.unwrap_or(DEFAULT_TEMPERATURE).clamp(0.0, 2.0)
}

fn cap_max_tokens(requested: Option<u32>) -> u32 {
    requested.unwrap_or(DEFAULT_MAX_TOKENS).min(MAX_OUTPUT_TOKENS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_defaults_when_unset() {
        assert!((clamp_temperature(None) - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_temperature_clamped_to_provider_bounds() {
        assert!((clamp_temperature(Some(9.5)) - 2.0).abs() < f32::EPSILON);
        assert!((clamp_temperature(Some(-1.0)) - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_max_tokens_hard_capped_at_16000() {
        assert_eq!(cap_max_tokens(Some(64000)), MAX_OUTPUT_TOKENS);
        assert_eq!(cap_max_tokens(Some(2048)), 2048);
        assert_eq!(cap_max_tokens(None), DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_reasoning_hint_omitted_from_request_body_when_disabled() {
        let body = ChatRequest {
            model: "test/model",
            messages: vec![],
            temperature: 0.2,
            max_tokens: 100,
            seed: SEED,
            reasoning: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("reasoning"));
    }
}
