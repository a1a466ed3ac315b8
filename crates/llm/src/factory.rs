//! Synthesizer provider factory.

use crate::client::SynthesizerClient;
use crate::providers::OllamaClient;
use coderag_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a synthesizer client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (for providers that require it)
/// * `timeout_secs` - Per-request timeout in seconds
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout_secs: u64,
) -> AppResult<Arc<dyn SynthesizerClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = OllamaClient::with_base_url(base_url, timeout_secs);
            Ok(Arc::new(client))
        }
        "openai" => {
            if api_key.is_none() {
                return Err(AppError::Config(
                    "OpenAI provider requires API key".to_string(),
                ));
            }
            Err(AppError::Config(
                "OpenAI provider not yet implemented".to_string(),
            ))
        }
        "claude" | "anthropic" => {
            if api_key.is_none() {
                return Err(AppError::Config(
                    "Claude provider requires API key".to_string(),
                ));
            }
            Err(AppError::Config(
                "Claude provider not yet implemented".to_string(),
            ))
        }
        other => Err(AppError::Config(format!("Unknown provider: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None, 60);
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("ollama", Some("http://localhost:8080"), None, 60);
        assert!(client.is_ok());
    }

    #[test]
    fn test_openai_requires_api_key() {
        match create_client("openai", None, None, 60) {
            Err(AppError::Config(message)) => assert!(message.contains("requires API key")),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, 60) {
            Err(AppError::Config(message)) => assert!(message.contains("Unknown provider")),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }
}
