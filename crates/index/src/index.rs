//! The document index: immutable section storage with id lookups.
//!
//! The index owns every `Section` and `Table` for the process lifetime.
//! Other components hold `&Section` references or id keys, never copies.

use crate::parser;
use crate::section::{Section, SectionId};
use coderag_core::{AppError, AppResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Immutable index of sections keyed by identifier.
#[derive(Debug)]
pub struct DocumentIndex {
    sections: BTreeMap<SectionId, Section>,
    /// Table id ("Table 9.20.2.1.") to owning section
    table_owners: BTreeMap<String, SectionId>,
}

impl DocumentIndex {
    /// Parse a raw corpus into an index.
    ///
    /// Fails with `AppError::Parse` on malformed numbering or unterminated
    /// tables; the load aborts rather than producing a partial index.
    pub fn load(corpus: &str) -> AppResult<Self> {
        let sections = parser::parse_corpus(corpus)?;

        let table_owners = sections
            .iter()
            .flat_map(|(id, s)| s.tables.iter().map(move |t| (t.id.clone(), id.clone())))
            .collect();

        let index = Self {
            sections,
            table_owners,
        };
        tracing::info!(
            "Loaded document index: {} sections, {} tables",
            index.len(),
            index.table_owners.len()
        );
        Ok(index)
    }

    /// Load a corpus from a file on disk.
    pub fn load_file(path: &Path) -> AppResult<Self> {
        let corpus = std::fs::read_to_string(path)?;
        Self::load(&corpus)
    }

    /// Look up a section by id, failing with `NotFound` if absent.
    pub fn lookup(&self, id: &SectionId) -> AppResult<&Section> {
        self.sections
            .get(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Non-failing lookup.
    pub fn get(&self, id: &SectionId) -> Option<&Section> {
        self.sections.get(id)
    }

    /// True if the id is present.
    pub fn contains(&self, id: &SectionId) -> bool {
        self.sections.contains_key(id)
    }

    /// The section owning the given table id, if any.
    pub fn table_owner(&self, table_id: &str) -> Option<&SectionId> {
        self.table_owners.get(table_id)
    }

    /// Immediate child sections of the given id, ascending identifier order.
    ///
    /// Only direct children qualify; grandchildren are excluded.
    pub fn children(&self, id: &SectionId) -> Vec<&Section> {
        self.sections
            .values()
            .filter(|s| s.id.depth() == id.depth() + 1 && s.id.is_descendant_of(id))
            .collect()
    }

    /// Iterate sections in ascending identifier order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    /// Iterate section ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &SectionId> {
        self.sections.keys()
    }

    /// Number of sections in the index.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True if the index holds no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Collect summary statistics for the index.
    pub fn stats(&self) -> IndexStats {
        let mut depth_counts: BTreeMap<usize, usize> = BTreeMap::new();
        let mut tables = 0usize;
        for section in self.sections.values() {
            *depth_counts.entry(section.id.depth()).or_insert(0) += 1;
            tables += section.tables.len();
        }

        let references = self
            .sections
            .values()
            .map(|s| crate::refs::extract_references(s, self).len())
            .sum();

        IndexStats {
            sections: self.sections.len(),
            tables,
            references,
            depth_counts,
        }
    }
}

/// Summary statistics for a loaded index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    /// Total addressable sections
    pub sections: usize,

    /// Total lifted tables
    pub tables: usize,

    /// Total extracted cross-references (resolved and unresolved)
    pub references: usize,

    /// Section count per nesting depth
    pub depth_counts: BTreeMap<usize, usize>,
}

/// Shared handle to the current index.
///
/// Queries take a snapshot with [`current`](IndexHandle::current) and run
/// entirely against that frozen `Arc`. A corpus rebuild constructs a fresh
/// `DocumentIndex` off to the side and publishes it with
/// [`swap`](IndexHandle::swap); in-flight queries keep their old snapshot and
/// never observe a partially-built index.
#[derive(Clone)]
pub struct IndexHandle {
    inner: Arc<RwLock<Arc<DocumentIndex>>>,
}

impl IndexHandle {
    /// Wrap a freshly loaded index.
    pub fn new(index: DocumentIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    /// Snapshot of the current index.
    pub fn current(&self) -> Arc<DocumentIndex> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Atomically replace the index with a rebuilt one.
    pub fn swap(&self, index: DocumentIndex) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(index);
        tracing::info!("Swapped in rebuilt document index");
    }
}
