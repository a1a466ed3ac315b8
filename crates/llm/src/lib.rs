//! Answer synthesis boundary.
//!
//! This crate provides a provider-agnostic abstraction for the model that
//! turns a built prompt into an answer. The retrieval pipeline never depends
//! on it: synthesis failures are reported as their own error class and leave
//! retrieval artifacts intact.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - Future: OpenAI, Anthropic, etc.
//!
//! # Example
//! ```no_run
//! use coderag_llm::{SynthesizerClient, SynthesisRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = SynthesisRequest::new("What is the minimum ceiling height?", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{SynthesisRequest, SynthesisResponse, SynthesisUsage, SynthesizerClient};
pub use factory::create_client;
pub use providers::OllamaClient;
