//! Sections command handler.
//!
//! Inspection tool for the document index: list indexed sections, or show
//! one section with its breadcrumb, tables, and resolved cross-references.

use clap::Args;
use coderag_core::{config::AppConfig, AppError, AppResult};
use coderag_index::{extract_references, DocumentIndex, RefTarget, SectionId};

/// Inspect indexed sections and their cross-references
#[derive(Args, Debug)]
pub struct SectionsCommand {
    /// Section identifier to show (e.g. "9.20.5.1."); lists all when omitted
    pub id: Option<String>,

    /// Only list sections at this depth (number of id groups)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SectionsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing sections command");

        let corpus_path = config.corpus_path()?;
        let index = DocumentIndex::load_file(&corpus_path)?;

        match &self.id {
            Some(id) => self.show_section(&index, id),
            None => self.list_sections(&index),
        }
    }

    fn show_section(&self, index: &DocumentIndex, raw_id: &str) -> AppResult<()> {
        let id: SectionId = raw_id
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid section id: {}", raw_id)))?;
        let section = index.lookup(&id)?;
        let references = extract_references(section, index);

        if self.json {
            let output = serde_json::json!({
                "section": section,
                "references": references
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("Section {}", section.id);
        println!("Title: {}", section.title);
        if !section.context_path.is_empty() {
            println!("Context: {}", section.breadcrumb());
        }
        println!();
        println!("{}", section.body);

        if !section.tables.is_empty() {
            println!();
            for table in &section.tables {
                if table.caption.is_empty() {
                    println!("{}", table.id);
                } else {
                    println!("{} {}", table.id, table.caption);
                }
            }
        }

        if !references.is_empty() {
            println!();
            println!("References:");
            for reference in &references {
                match &reference.target {
                    RefTarget::Resolved { id, locator } => match locator {
                        Some(locator) => println!("  {} ({})", id, locator),
                        None => println!("  {}", id),
                    },
                    RefTarget::Unresolved { raw } => println!("  {} [unresolved]", raw),
                }
            }
        }

        Ok(())
    }

    fn list_sections(&self, index: &DocumentIndex) -> AppResult<()> {
        let sections: Vec<_> = index
            .sections()
            .filter(|s| self.depth.map_or(true, |d| s.id.depth() == d))
            .collect();

        if self.json {
            let output: Vec<_> = sections
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "id": s.id,
                        "title": s.title,
                        "tables": s.tables.len()
                    })
                })
                .collect();
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        for section in &sections {
            println!("{} {}", section.id, section.title);
        }
        tracing::info!("Listed {} sections", sections.len());

        Ok(())
    }
}
