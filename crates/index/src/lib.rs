//! Document index for hierarchical regulatory codes.
//!
//! This crate parses a building-code style Markdown corpus into addressable
//! `Section` nodes keyed by dotted numeric identifiers ("9.20.11.6."), keeps
//! them in an immutable in-memory index, and resolves the cross-references
//! embedded in section bodies ("Sentence 9.15.2.3.(4)", "see 9.20.10.").
//!
//! The index is loaded once and never mutated; queries hold an `Arc` snapshot
//! obtained from an [`IndexHandle`], and corpus rebuilds swap the whole index
//! atomically so in-flight queries never observe a partial state.

pub mod index;
pub mod parser;
pub mod refs;
pub mod section;

// Re-export commonly used types
pub use index::{DocumentIndex, IndexHandle, IndexStats};
pub use refs::{extract_references, RefTarget, Reference};
pub use section::{Section, SectionId, Table};
