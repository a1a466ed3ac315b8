//! Ollama synthesizer provider.
//!
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{SynthesisRequest, SynthesisResponse, SynthesisUsage, SynthesizerClient};
use coderag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    stream: bool,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama synthesizer client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// Per-request timeout
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with default settings.
    ///
    /// Default URL: http://localhost:11434
    pub fn new() -> Self {
        Self::with_base_url("http://localhost:11434", 60)
    }

    /// Create a new Ollama client with a custom base URL and timeout.
    pub fn with_base_url(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    fn to_ollama_request(&self, request: &SynthesisRequest) -> OllamaRequest {
        OllamaRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            temperature: request.temperature,
            num_predict: request.max_tokens,
            stream: false,
        }
    }

    fn convert_response(&self, response: OllamaResponse) -> SynthesisResponse {
        let usage = SynthesisUsage::new(
            response.prompt_eval_count.unwrap_or(0),
            response.eval_count.unwrap_or(0),
        );

        SynthesisResponse {
            content: response.response,
            model: response.model,
            usage,
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SynthesizerClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &SynthesisRequest) -> AppResult<SynthesisResponse> {
        tracing::info!("Sending synthesis request to Ollama");
        tracing::debug!("Model: {}, prompt chars: {}", request.model, request.prompt.len());

        let ollama_request = self.to_ollama_request(request);
        let url = format!("{}/api/generate", self.base_url);

        let send = async {
            let response = self
                .client
                .post(&url)
                .json(&ollama_request)
                .send()
                .await
                .map_err(|e| {
                    AppError::Synthesis(format!("Failed to send request to Ollama: {}", e))
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(AppError::Synthesis(format!(
                    "Ollama API error ({}): {}",
                    status, error_text
                )));
            }

            // Non-streaming: Ollama returns a single JSON object
            let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
                AppError::Synthesis(format!("Failed to parse Ollama response: {}", e))
            })?;

            Ok(ollama_response)
        };

        let ollama_response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| {
                AppError::Synthesis(format!(
                    "Synthesis timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        tracing::info!("Received synthesis response from Ollama");
        Ok(self.convert_response(ollama_response))
    }
}
