//! Configuration management for the CodeRAG CLI.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (.coderag/config.yaml)
//!
//! The configuration is workspace-centric, with run artifacts stored under
//! `.coderag/` inside the workspace.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// CLI behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .coderag/)
    pub workspace: PathBuf,

    /// Path to the corpus file (hierarchical Markdown)
    pub corpus: Option<PathBuf>,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Answer synthesizer provider (e.g., "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Synthesizer endpoint override
    pub endpoint: Option<String>,

    /// API key for the synthesizer provider
    pub api_key: Option<String>,

    /// Number of primary sections to retrieve
    pub top_k: usize,

    /// Ranker strategy name ("keyword" or "trigram")
    pub ranker: String,

    /// Synthesizer timeout in seconds
    pub timeout_secs: u64,

    /// Character budget for the assembled context
    pub max_context_chars: usize,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    corpus: Option<CorpusConfig>,
    retrieval: Option<RetrievalConfig>,
    llm: Option<LlmConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CorpusConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalConfig {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    ranker: Option<String>,
    #[serde(rename = "maxContextChars")]
    max_context_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmConfig {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            corpus: None,
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key: None,
            top_k: 3,
            ranker: "keyword".to_string(),
            timeout_secs: 60,
            max_context_chars: 15_000,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `CODERAG_WORKSPACE`: Override workspace path
    /// - `CODERAG_CORPUS`: Path to the corpus file
    /// - `CODERAG_CONFIG`: Path to config file
    /// - `CODERAG_PROVIDER`: Synthesizer provider
    /// - `CODERAG_MODEL`: Model identifier
    /// - `CODERAG_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("CODERAG_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(corpus) = std::env::var("CODERAG_CORPUS") {
            config.corpus = Some(PathBuf::from(corpus));
        }

        if let Ok(config_file) = std::env::var("CODERAG_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Validate workspace exists
        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        // Load from YAML config file if it exists
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".coderag/config.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("CODERAG_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("CODERAG_MODEL") {
            config.model = model;
        }

        if config.api_key.is_none() {
            config.api_key = std::env::var("CODERAG_API_KEY").ok();
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(corpus) = config_file.corpus {
            if let Some(path) = corpus.path {
                result.corpus = Some(PathBuf::from(path));
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                result.top_k = top_k;
            }
            if let Some(ranker) = retrieval.ranker {
                result.ranker = ranker;
            }
            if let Some(max_chars) = retrieval.max_context_chars {
                result.max_context_chars = max_chars;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(endpoint) = llm.endpoint {
                result.endpoint = Some(endpoint);
            }
            if let Some(timeout) = llm.timeout_secs {
                result.timeout_secs = timeout;
            }
            if let Some(key_env) = llm.api_key_env {
                result.api_key = std::env::var(&key_env).ok();
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        corpus: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(corpus) = corpus {
            self.corpus = Some(corpus);
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve the corpus path, failing with a config error if none is set.
    pub fn corpus_path(&self) -> AppResult<PathBuf> {
        self.corpus.clone().ok_or_else(|| {
            AppError::Config(
                "No corpus configured. Pass --corpus or set corpus.path in .coderag/config.yaml"
                    .to_string(),
            )
        })
    }

    /// Directory for run artifacts (prompt/answer transcripts).
    pub fn runs_dir(&self) -> PathBuf {
        self.workspace.join(".coderag").join("runs")
    }

    /// Ensure the .coderag directory exists in the workspace.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let dir = self.workspace.join(".coderag");
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.top_k, 3);
        assert_eq!(config.ranker, "keyword");
        assert!(config.corpus.is_none());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config = AppConfig::default().with_overrides(
            Some(PathBuf::from("/tmp")),
            Some(PathBuf::from("corpus.md")),
            None,
            Some("ollama".to_string()),
            Some("llama3".to_string()),
            None,
            true,
            true,
        );

        assert_eq!(config.workspace, PathBuf::from("/tmp"));
        assert_eq!(config.corpus, Some(PathBuf::from("corpus.md")));
        assert_eq!(config.model, "llama3");
        assert!(config.verbose);
        assert!(config.no_color);
        // Verbose implies debug logging when no explicit level is set
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_corpus_path_requires_corpus() {
        let config = AppConfig::default();
        assert!(config.corpus_path().is_err());
    }
}
