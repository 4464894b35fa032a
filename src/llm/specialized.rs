//! Client for the specialized fine-tuned inference endpoint.
//!
//! Reachability is established once at construction via a bounded health
//! probe and carried as an [`EndpointCapability`]; it is never re-probed per
//! request. A later generation failure is handled by the caller's per-call
//! fallback, not by probing again.

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::OrchestrationError;
use crate::types::Capability;

/// Capability descriptor for the specialized endpoint, fixed at startup.
pub type EndpointCapability = Capability<SpecializedClient>;

/// Body for `POST /generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub max_new_tokens: u32,
    pub temperature: f64,
    pub do_sample: bool,
}

/// Body of a successful `POST /generate` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub result: String,
}

/// HTTP client for the specialized inference endpoint.
#[derive(Debug, Clone)]
pub struct SpecializedClient {
    http: reqwest::Client,
    base_url: String,
    max_new_tokens: u32,
    temperature: f64,
}

impl SpecializedClient {
    /// Probe `GET {base}/health` once and wrap the client in a capability
    /// descriptor. Any non-200 status or transport error means unreachable.
    pub async fn probe(settings: &Settings) -> EndpointCapability {
        let http = reqwest::Client::builder()
            .timeout(settings.generate_timeout)
            .build()
            .unwrap_or_default();

        let client = Self {
            http,
            base_url: settings.specialized_url.clone(),
            max_new_tokens: settings.max_new_tokens,
            temperature: settings.specialized_temperature,
        };

        let health_url = format!("{}/health", client.base_url);
        let probe = client
            .http
            .get(&health_url)
            .timeout(settings.probe_timeout)
            .send()
            .await;

        match probe {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                log::info!("specialized endpoint reachable at {}", client.base_url);
                Capability::Available(client)
            }
            Ok(response) => {
                let reason = format!("health probe returned {}", response.status());
                log::warn!("specialized endpoint unavailable: {reason}");
                Capability::unavailable(reason)
            }
            Err(e) => {
                let reason = format!("health probe failed: {e}");
                log::warn!("specialized endpoint unavailable: {reason}");
                Capability::unavailable(reason)
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run primary-stage generation. Timeouts, non-2xx responses, and
    /// malformed bodies all surface as transport failures for the caller's
    /// substitution fallback.
    pub async fn generate(&self, prompt: &str) -> Result<String, OrchestrationError> {
        let body = GenerateRequest {
            prompt: prompt.to_string(),
            max_new_tokens: self.max_new_tokens,
            temperature: self.temperature,
            do_sample: true,
        };

        let response = self
            .http
            .post(format!("{}/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OrchestrationError::Transport(format!(
                "specialized endpoint returned {status}"
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            OrchestrationError::Transport(format!("malformed generate response: {e}"))
        })?;

        Ok(parsed.result)
    }

    /// Fixed generation parameters, for status reporting.
    pub fn generation_params(&self) -> (u32, f64) {
        (self.max_new_tokens, self.temperature)
    }
}
