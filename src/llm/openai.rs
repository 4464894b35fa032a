//! OpenAI-compatible chat completion client.
//!
//! Thin client over the Chat Completions API used as the general-purpose
//! Language Generation Service. Retries transient failures (429 and 5xx)
//! with exponential backoff; 4xx responses and malformed bodies are
//! reported as generation errors.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::OrchestrationError;
use crate::llm::LanguageModel;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_RETRIES: u32 = 2;

/// Clip an unparseable response body for error messages, on a char
/// boundary so multibyte bodies cannot panic the clipping itself.
fn body_preview(text: &str) -> String {
    text.chars().take(500).collect()
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f64,
}

impl OpenAiChatClient {
    pub fn new(
        model: impl Into<String>,
        api_key: Option<String>,
        base_url: impl Into<String>,
        temperature: f64,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.or_else(|| std::env::var("OPENAI_API_KEY").ok()),
            model: model.into(),
            temperature,
        }
    }

    fn build_request_body(&self, prompt: &str) -> Value {
        serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}],
        })
    }

    fn parse_response(&self, response: &Value) -> Result<String, OrchestrationError> {
        let content = response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                OrchestrationError::Generation("no message content in completion response".into())
            })?;

        if let Some(usage) = response.get("usage") {
            log::debug!(
                "token usage: prompt={}, completion={}",
                usage.get("prompt_tokens").and_then(|v| v.as_i64()).unwrap_or(0),
                usage.get("completion_tokens").and_then(|v| v.as_i64()).unwrap_or(0),
            );
        }

        Ok(content.to_string())
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, OrchestrationError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            OrchestrationError::Generation(
                "API key not set; set OPENAI_API_KEY or pass one to the constructor".into(),
            )
        })?;

        let endpoint = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(prompt);

        let mut last_error: Option<OrchestrationError> = None;
        let mut retry_delay = Duration::from_secs(1);

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                log::warn!("completion retry attempt {attempt} after {retry_delay:?}");
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            let response = match self
                .http
                .post(&endpoint)
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(e.into());
                    continue;
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = Some(OrchestrationError::Transport(format!(
                    "completion endpoint returned {status}"
                )));
                continue;
            }

            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    last_error = Some(e.into());
                    continue;
                }
            };

            if status.is_client_error() {
                return Err(OrchestrationError::Generation(format!(
                    "completion endpoint rejected request ({status}): {text}"
                )));
            }

            let json: Value = serde_json::from_str(&text).map_err(|e| {
                OrchestrationError::Generation(format!(
                    "malformed completion response: {e} - body: {}",
                    body_preview(&text)
                ))
            })?;

            return self.parse_response(&json);
        }

        Err(last_error
            .unwrap_or_else(|| OrchestrationError::Transport("completion call failed".into())))
    }
}
