//! Retrieval and context assembly for the document index.
//!
//! Given a natural-language query, the retriever ranks all sections with a
//! pluggable [`Ranker`] strategy and selects the top-k as primary. The
//! assembler expands the primary set with the sections they cite (exactly
//! one hop) and renders the structured prompt context.

pub mod assemble;
pub mod ranker;
pub mod retrieve;


// Re-export commonly used types
pub use assemble::{assemble, AssembledContext, ContextBlock, ReferencedEntry};
pub use ranker::{ranker_for, KeywordRanker, Ranker, TrigramRanker};
pub use retrieve::{retrieve, Provenance, RankedSection, RetrievalResult};
