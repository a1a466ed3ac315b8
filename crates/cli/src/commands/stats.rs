//! Stats command handler.
//!
//! Displays index statistics for the configured corpus.

use clap::Args;
use coderag_core::{config::AppConfig, AppError, AppResult};
use coderag_index::DocumentIndex;

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let corpus_path = config.corpus_path()?;
        let index = DocumentIndex::load_file(&corpus_path)?;
        let stats = index.stats();

        if self.json {
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("Corpus: {}", corpus_path.display());
        println!("Sections:   {}", stats.sections);
        println!("Tables:     {}", stats.tables);
        println!("References: {}", stats.references);
        println!("By depth:");
        for (depth, count) in &stats.depth_counts {
            println!("  {} groups: {}", depth, count);
        }

        Ok(())
    }
}
