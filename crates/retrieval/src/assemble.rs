//! Context assembly: one-hop reference expansion and rendering.
//!
//! Each primary section becomes a self-contained block carrying its own
//! referenced sections, so a referenced section cited by two primaries is
//! rendered under both. Expansion is exactly one hop: citations inside a
//! referenced section's body are never followed. This is a deliberate bound
//! to prevent context explosion on densely cross-linked regulatory text.

use crate::retrieve::{Provenance, RetrievalResult};
use coderag_core::AppResult;
use coderag_index::{extract_references, DocumentIndex, RefTarget, SectionId};
use serde::Serialize;
use std::collections::BTreeMap;

/// A referenced section entry within a context block.
#[derive(Debug, Clone, Serialize)]
pub struct ReferencedEntry {
    pub id: SectionId,

    /// Sub-locator for display ("(4)", "Table 9.20.5.1."), if the citation
    /// carried one
    pub locator: Option<String>,
}

/// One primary section with its one-hop expansion.
#[derive(Debug, Clone, Serialize)]
pub struct ContextBlock {
    pub primary: SectionId,
    pub score: f32,

    /// Resolved referenced sections, ascending id order
    pub referenced: Vec<ReferencedEntry>,

    /// Citations that could not be resolved against the index
    pub unresolved: Vec<String>,
}

/// Assembled context for one query, ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct AssembledContext {
    pub blocks: Vec<ContextBlock>,

    /// Character budget applied when rendering
    pub max_chars: usize,
}

/// Default rendering budget, matching a mid-size model context.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 15_000;

/// Expand the primary sections with the sections they cite.
///
/// Referenced sections already in the primary set are not duplicated as
/// referenced entries. Each block's referenced list is de-duplicated by id
/// and sorted ascending.
pub fn assemble(
    result: &RetrievalResult,
    index: &DocumentIndex,
    max_chars: usize,
) -> AppResult<AssembledContext> {
    let primary_ids = result.primary_ids();
    let mut blocks = Vec::new();

    for hit in result.hits.iter().filter(|h| h.provenance == Provenance::Primary) {
        let section = index.lookup(&hit.id)?;
        let references = extract_references(section, index);

        // De-duplicate by target id, keeping the first citation's locator
        let mut referenced: BTreeMap<SectionId, Option<String>> = BTreeMap::new();
        let mut unresolved: Vec<String> = Vec::new();

        for reference in references {
            match reference.target {
                RefTarget::Resolved { id, locator } => {
                    if primary_ids.contains(&id) {
                        continue;
                    }
                    referenced.entry(id).or_insert(locator);
                }
                RefTarget::Unresolved { raw } => {
                    if !unresolved.contains(&raw) {
                        unresolved.push(raw);
                    }
                }
            }
        }

        blocks.push(ContextBlock {
            primary: hit.id.clone(),
            score: hit.score,
            referenced: referenced
                .into_iter()
                .map(|(id, locator)| ReferencedEntry { id, locator })
                .collect(),
            unresolved,
        });
    }

    tracing::debug!(
        "Assembled {} context blocks ({} referenced sections total)",
        blocks.len(),
        blocks.iter().map(|b| b.referenced.len()).sum::<usize>()
    );

    Ok(AssembledContext { blocks, max_chars })
}

impl AssembledContext {
    /// All referenced section ids across blocks, ascending, de-duplicated.
    pub fn referenced_ids(&self) -> Vec<SectionId> {
        let mut ids: Vec<SectionId> = self
            .blocks
            .iter()
            .flat_map(|b| b.referenced.iter().map(|r| r.id.clone()))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Primary section ids in rank order.
    pub fn primary_ids(&self) -> Vec<SectionId> {
        self.blocks.iter().map(|b| b.primary.clone()).collect()
    }

    /// Render the assembled context as the prompt body.
    ///
    /// Output is deterministic given identical primary selection and index
    /// state. Whole blocks are dropped once the character budget would be
    /// exceeded, so every included block stays self-contained; a first block
    /// larger than the budget is dropped too, never partially rendered. An
    /// empty primary set renders an empty string.
    pub fn render(&self, index: &DocumentIndex) -> AppResult<String> {
        let mut out = String::new();

        for (i, block) in self.blocks.iter().enumerate() {
            let rendered = self.render_block(block, i + 1, index)?;
            if self.max_chars > 0 && out.len() + rendered.len() > self.max_chars {
                tracing::warn!(
                    "Context budget reached; including only {} of {} sections",
                    i,
                    self.blocks.len()
                );
                break;
            }
            out.push_str(&rendered);
        }

        Ok(out)
    }

    fn render_block(
        &self,
        block: &ContextBlock,
        ordinal: usize,
        index: &DocumentIndex,
    ) -> AppResult<String> {
        let section = index.lookup(&block.primary)?;
        let mut parts: Vec<String> = Vec::new();
        let rule = "=".repeat(60);

        parts.push(format!("\n{}", rule));
        parts.push(format!("Section {}: {}", ordinal, section.id));
        parts.push(rule.clone());
        parts.push(format!("Title: {}", section.title));

        if !section.context_path.is_empty() {
            parts.push(format!("Context: {}", section.breadcrumb()));
        }

        parts.push("\nContent:".to_string());
        parts.push(section.body.clone());

        if !section.tables.is_empty() {
            parts.push(format!("\n--- Tables for Section {} ---", section.id));
            for table in &section.tables {
                parts.push(format!("\n{}", render_table(table)));
            }
        }

        if !block.referenced.is_empty() {
            parts.push("\n--- Referenced Sections ---".to_string());
            for entry in &block.referenced {
                let referenced = index.lookup(&entry.id)?;
                parts.push(format!("\nReferenced Section: {}", referenced.id));
                if let Some(locator) = &entry.locator {
                    parts.push(format!("Cited as: {}", locator));
                }
                parts.push(format!("Title: {}", referenced.title));
                parts.push(format!("Content: {}", referenced.body));

                if !referenced.tables.is_empty() {
                    parts.push(format!("Tables in {}:", referenced.id));
                    for table in &referenced.tables {
                        parts.push(format!("\n{}", render_table(table)));
                    }
                }
            }
        }

        let children = index.children(&block.primary);
        if !children.is_empty() {
            let listing: Vec<String> = children
                .iter()
                .map(|c| format!("{} ({})", c.id, c.title))
                .collect();
            parts.push(format!("\nSubsections: {}", listing.join(", ")));
        }

        if !block.unresolved.is_empty() {
            parts.push(format!(
                "\nUnresolved references: {}",
                block.unresolved.join(", ")
            ));
        }

        parts.push(String::new());
        Ok(parts.join("\n"))
    }
}

/// Format a table for inclusion in the rendered context.
fn render_table(table: &coderag_index::Table) -> String {
    let mut parts = Vec::new();
    if table.caption.is_empty() {
        parts.push(table.id.clone());
    } else {
        parts.push(format!("{} {}", table.id, table.caption));
    }
    parts.push(table.content.clone());
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::KeywordRanker;
    use crate::retrieve::{retrieve, RankedSection, RetrievalResult};

    const CORPUS: &str = "\
9.15.2.3. Masonry Piers

Piers shall be laterally supported as described in Section 9.21.3.1.

9.20.5.1. Mortar Materials

Mortar for masonry shall use clean sand.

9.20.11.6. Anchorage of Masonry

Masonry shall be anchored to piers as required by Sentence 9.15.2.3.(4).

9.21.3.1. Lateral Support

Chimneys and piers shall be laterally supported.
";

    fn context_for(query: &str, k: usize) -> (AssembledContext, DocumentIndex) {
        let index = DocumentIndex::load(CORPUS).unwrap();
        let result = retrieve(query, &index, &KeywordRanker, k).unwrap();
        let context = assemble(&result, &index, DEFAULT_MAX_CONTEXT_CHARS).unwrap();
        (context, index)
    }

    #[test]
    fn test_referenced_sections_included_in_full() {
        let (context, index) = context_for("anchorage of masonry", 1);
        assert_eq!(context.primary_ids()[0].to_string(), "9.20.11.6.");

        let referenced = context.referenced_ids();
        assert_eq!(referenced.len(), 1);
        assert_eq!(referenced[0].to_string(), "9.15.2.3.");

        let rendered = context.render(&index).unwrap();
        assert!(rendered.contains("Referenced Section: 9.15.2.3."));
        // Full body of the referenced section, not just its id
        assert!(rendered.contains("laterally supported as described"));
    }

    #[test]
    fn test_expansion_is_exactly_one_hop() {
        let (context, index) = context_for("anchorage of masonry", 1);
        let rendered = context.render(&index).unwrap();

        // 9.21.3.1. is reachable only via 9.20.11.6. -> 9.15.2.3. -> 9.21.3.1.
        // Its citation may appear inside the referenced body text, but the
        // section itself is never rendered.
        assert!(!rendered.contains("Referenced Section: 9.21.3.1."));
        assert!(!rendered.contains("Lateral Support"));
    }

    #[test]
    fn test_primary_sections_not_duplicated_as_referenced() {
        // Both the citing and the cited section are primary
        let index = DocumentIndex::load(CORPUS).unwrap();
        let result = retrieve("masonry piers anchorage", &index, &KeywordRanker, 4).unwrap();
        let context = assemble(&result, &index, DEFAULT_MAX_CONTEXT_CHARS).unwrap();

        let primaries = context.primary_ids();
        let pier_id: SectionId = "9.15.2.3.".parse().unwrap();
        if primaries.contains(&pier_id) {
            for block in &context.blocks {
                assert!(block.referenced.iter().all(|r| r.id != pier_id));
            }
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let (context, index) = context_for("masonry mortar", 2);
        assert_eq!(
            context.render(&index).unwrap(),
            context.render(&index).unwrap()
        );
    }

    #[test]
    fn test_empty_primary_set_renders_empty_context() {
        let (context, index) = context_for("masonry", 0);
        assert!(context.blocks.is_empty());
        assert_eq!(context.render(&index).unwrap(), "");
    }

    #[test]
    fn test_subsection_listing_shows_immediate_children() {
        let corpus = "\
9.20.5. Mortar

General requirements for mortar.

9.20.5.1. Mortar Materials

Mortar shall use clean materials.

9.20.5.1.1. Sand Quality

Sand shall be well graded.

9.20.5.2. Mortar Mixing

Mortar shall be mixed thoroughly.
";
        let index = DocumentIndex::load(corpus).unwrap();
        let result = RetrievalResult {
            query: "mortar".to_string(),
            hits: vec![RankedSection {
                id: "9.20.5.".parse().unwrap(),
                score: 1.0,
                provenance: Provenance::Primary,
            }],
        };

        let context = assemble(&result, &index, DEFAULT_MAX_CONTEXT_CHARS).unwrap();
        let rendered = context.render(&index).unwrap();

        // Direct children only; the grandchild 9.20.5.1.1. is not listed
        assert!(rendered
            .contains("Subsections: 9.20.5.1. (Mortar Materials), 9.20.5.2. (Mortar Mixing)"));
        assert!(!rendered.contains("Sand Quality"));
    }

    #[test]
    fn test_leaf_sections_render_no_subsection_line() {
        let (context, index) = context_for("mortar materials", 1);
        let rendered = context.render(&index).unwrap();
        assert!(!rendered.contains("Subsections:"));
    }

    #[test]
    fn test_char_budget_drops_whole_blocks() {
        let index = DocumentIndex::load(CORPUS).unwrap();
        let result = retrieve("masonry piers mortar anchorage", &index, &KeywordRanker, 4).unwrap();
        assert!(result.hits.len() >= 2);

        let full = assemble(&result, &index, 0).unwrap();
        let full_rendered = full.render(&index).unwrap();
        let second_block_at = full_rendered.find("\nSection 2:").unwrap();

        // A budget that fits the first block but not the second drops the
        // second block whole
        let context = assemble(&result, &index, second_block_at + 20).unwrap();
        let rendered = context.render(&index).unwrap();
        assert!(rendered.contains("Section 1:"));
        assert!(!rendered.contains("Section 2:"));
    }

    #[test]
    fn test_char_budget_applies_to_first_block() {
        let index = DocumentIndex::load(CORPUS).unwrap();
        let result = retrieve("masonry piers anchorage", &index, &KeywordRanker, 2).unwrap();
        assert!(!result.hits.is_empty());

        // A budget smaller than any block renders nothing rather than an
        // oversized first block
        let context = assemble(&result, &index, 50).unwrap();
        let rendered = context.render(&index).unwrap();
        assert!(rendered.is_empty());
    }
}
