//! Ask command handler.
//!
//! Runs the full pipeline: index the corpus, retrieve and expand sections,
//! build the synthesis prompt, and call the synthesizer. Retrieval artifacts
//! are written before synthesis so a dead model endpoint never loses them.

use clap::Args;
use coderag_core::{config::AppConfig, AppError, AppResult};
use coderag_index::{DocumentIndex, IndexHandle};
use coderag_llm::{create_client, SynthesisRequest};
use coderag_prompt::{build_prompt, load_template, PromptInputs, DEFAULT_TEMPLATE};
use coderag_retrieval::{assemble, ranker_for, retrieve};
use std::path::{Path, PathBuf};

/// Ask a question against the indexed corpus
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Number of primary sections to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Ranker strategy (keyword, trigram)
    #[arg(short, long)]
    pub ranker: Option<String>,

    /// Synthesizer timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Character budget for the assembled context
    #[arg(long)]
    pub max_context: Option<usize>,

    /// Build and print the prompt without calling the synthesizer
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum tokens in the answer
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperature for answer generation (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self
            .get_question()?
            .ok_or_else(|| AppError::Config("No question provided".to_string()))?;

        // 1. Index the corpus. The handle snapshots the index so a later
        // reload never shifts results mid-query.
        let corpus_path = config.corpus_path()?;
        let handle = IndexHandle::new(DocumentIndex::load_file(&corpus_path)?);
        let index = handle.current();
        tracing::info!("Indexed {} sections from {:?}", index.len(), corpus_path);

        // 2. Retrieve and expand
        let ranker_name = self.ranker.as_deref().unwrap_or(&config.ranker);
        let ranker = ranker_for(ranker_name)?;
        let top_k = self.top_k.unwrap_or(config.top_k);
        let max_context = self.max_context.unwrap_or(config.max_context_chars);

        let result = retrieve(&question, &index, ranker.as_ref(), top_k)?;
        let context = assemble(&result, &index, max_context)?;
        let rendered = context.render(&index)?;

        // 3. Build the prompt
        let template = load_template(&config.workspace)?;
        let built = build_prompt(
            template.as_deref().unwrap_or(DEFAULT_TEMPLATE),
            PromptInputs {
                question: &question,
                context: &rendered,
                ranker: ranker_name,
                primary_sections: context.primary_ids().iter().map(|id| id.to_string()).collect(),
                referenced_sections: context
                    .referenced_ids()
                    .iter()
                    .map(|id| id.to_string())
                    .collect(),
            },
        )?;

        // 4. Persist retrieval artifacts before synthesis
        let run_dir = self.create_run_dir(config)?;
        std::fs::write(run_dir.join("prompt.txt"), &built.user)?;
        let metadata_json = serde_json::to_string_pretty(&built.metadata)
            .map_err(|e| AppError::Serialization(e.to_string()))?;
        std::fs::write(run_dir.join("metadata.json"), metadata_json)?;
        tracing::info!("Wrote prompt artifacts to {:?}", run_dir);

        if self.dry_run {
            return self.output_dry_run(&built);
        }

        // 5. Synthesize
        let timeout_secs = self.timeout.unwrap_or(config.timeout_secs);
        let client = create_client(
            &config.provider,
            config.endpoint.as_deref(),
            config.api_key.as_deref(),
            timeout_secs,
        )?;

        let mut request = SynthesisRequest::new(built.user.clone(), &config.model);
        if let Some(system) = built.system.clone() {
            request = request.with_system(system);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let response = match client.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                // Retrieval succeeded; only the synthesis step is lost
                tracing::warn!("Synthesis failed, prompt preserved at {:?}", run_dir);
                eprintln!("{}", retrieval_summary(&built.metadata));
                return Err(e);
            }
        };

        std::fs::write(run_dir.join("answer.txt"), &response.content)?;

        // 6. Output
        if self.json {
            let output = serde_json::json!({
                "answer": response.content,
                "model": response.model,
                "provider": config.provider,
                "usage": {
                    "promptTokens": response.usage.prompt_tokens,
                    "completionTokens": response.usage.completion_tokens,
                    "totalTokens": response.usage.total_tokens
                },
                "metadata": built.metadata
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", response.content);
            tracing::debug!(
                "Token usage - Prompt: {}, Completion: {}, Total: {}",
                response.usage.prompt_tokens,
                response.usage.completion_tokens,
                response.usage.total_tokens
            );
        }

        Ok(())
    }

    /// Print the built prompt instead of synthesizing.
    fn output_dry_run(&self, built: &coderag_prompt::BuiltPrompt) -> AppResult<()> {
        if self.json {
            let output = serde_json::json!({
                "prompt": built.user,
                "metadata": built.metadata
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", built.user);
        }
        Ok(())
    }

    /// Create a timestamped directory for this run's artifacts.
    fn create_run_dir(&self, config: &AppConfig) -> AppResult<PathBuf> {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        let mut run_dir = config.runs_dir().join(&timestamp);

        // Same-second reruns get a numeric suffix
        let mut attempt = 1;
        while run_dir.exists() {
            run_dir = config.runs_dir().join(format!("{}-{}", timestamp, attempt));
            attempt += 1;
        }

        std::fs::create_dir_all(&run_dir)?;
        Ok(run_dir)
    }

    /// Get the question text from the positional argument or a file.
    fn get_question(&self) -> AppResult<Option<String>> {
        if let Some(question) = &self.question {
            return Ok(Some(question.clone()));
        }
        match &self.file {
            Some(path) => Ok(Some(read_question_file(path)?)),
            None => Ok(None),
        }
    }
}

/// Summarize what retrieval found, for display when synthesis fails.
///
/// The run is not a total loss without an answer: the caller can still act
/// on the retrieved section ids.
fn retrieval_summary(metadata: &coderag_prompt::BuiltPromptMetadata) -> String {
    let mut lines = vec![format!(
        "Retrieved sections: {}",
        metadata.primary_sections.join(", ")
    )];
    if !metadata.referenced_sections.is_empty() {
        lines.push(format!(
            "Referenced sections: {}",
            metadata.referenced_sections.join(", ")
        ));
    }
    lines.join("\n")
}

fn read_question_file(path: &Path) -> AppResult<String> {
    let text = std::fs::read_to_string(path)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::Config(format!(
            "Question file is empty: {}",
            path.display()
        )));
    }
    Ok(trimmed.to_string())
}
