//! Top-k primary section selection.

use crate::ranker::Ranker;
use coderag_core::{AppError, AppResult};
use coderag_index::{DocumentIndex, SectionId};
use serde::Serialize;

/// How a section entered a retrieval result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Selected directly by the ranker for the query
    Primary,

    /// Pulled in because a primary section cites it
    Referenced,
}

/// A scored section in a retrieval result.
#[derive(Debug, Clone, Serialize)]
pub struct RankedSection {
    pub id: SectionId,
    pub score: f32,
    pub provenance: Provenance,
}

/// Ordered retrieval output for one query. Created per query and discarded
/// after context assembly.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub query: String,
    pub hits: Vec<RankedSection>,
}

impl RetrievalResult {
    /// Ids of the primary sections in rank order.
    pub fn primary_ids(&self) -> Vec<SectionId> {
        self.hits
            .iter()
            .filter(|h| h.provenance == Provenance::Primary)
            .map(|h| h.id.clone())
            .collect()
    }
}

/// Rank all sections against the query and select the top `k` as primary.
///
/// Guarantees:
/// - deterministic for identical (query, index) pairs
/// - ties broken by ascending identifier
/// - zero-score sections are never primary
/// - `k = 0` yields an empty primary set, not an error
///
/// Fails with `EmptyIndex` if the index has no sections.
pub fn retrieve(
    query: &str,
    index: &DocumentIndex,
    ranker: &dyn Ranker,
    k: usize,
) -> AppResult<RetrievalResult> {
    if index.is_empty() {
        return Err(AppError::EmptyIndex);
    }

    // Sections iterate in ascending id order, so the sort below is already
    // tie-broken by identifier for equal scores.
    let mut scored: Vec<(SectionId, f32)> = index
        .sections()
        .map(|s| (s.id.clone(), ranker.score(query, s)))
        .filter(|(_, score)| *score > 0.0)
        .collect();

    scored.sort_by(|(a_id, a_score), (b_id, b_score)| {
        b_score
            .total_cmp(a_score)
            .then_with(|| a_id.cmp(b_id))
    });

    let hits: Vec<RankedSection> = scored
        .into_iter()
        .take(k)
        .map(|(id, score)| RankedSection {
            id,
            score,
            provenance: Provenance::Primary,
        })
        .collect();

    tracing::debug!(
        "Retrieved {} primary sections for query ({} ranker, k={})",
        hits.len(),
        ranker.name(),
        k
    );

    Ok(RetrievalResult {
        query: query.to_string(),
        hits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::KeywordRanker;

    const CORPUS: &str = "\
9.5.3.1. Ceiling Heights

Rooms shall have a clear ceiling height.

9.15.2.3. Masonry Piers

Masonry piers shall support the applied loads.

9.20.11.6. Anchorage of Masonry

Masonry shall be anchored to masonry piers below.
";

    fn index() -> DocumentIndex {
        DocumentIndex::load(CORPUS).unwrap()
    }

    #[test]
    fn test_retrieve_ranks_relevant_sections_first() {
        let index = index();
        let result = retrieve("anchoring masonry to masonry piers", &index, &KeywordRanker, 3).unwrap();

        let ids = result.primary_ids();
        assert!(!ids.is_empty());
        // The masonry sections outrank ceiling heights
        let ceiling: SectionId = "9.5.3.1.".parse().unwrap();
        assert_ne!(ids[0], ceiling);
    }

    #[test]
    fn test_retrieve_is_deterministic() {
        let index = index();
        let a = retrieve("masonry piers", &index, &KeywordRanker, 3).unwrap();
        let b = retrieve("masonry piers", &index, &KeywordRanker, 3).unwrap();

        let ids_a = a.primary_ids();
        let ids_b = b.primary_ids();
        assert_eq!(ids_a, ids_b);
        for (x, y) in a.hits.iter().zip(b.hits.iter()) {
            assert_eq!(x.score, y.score);
        }
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let index = DocumentIndex::load(
            "9.10.1.1. Shared Term\n\nGypsum board.\n\n9.3.2.1. Shared Term\n\nGypsum board.\n",
        )
        .unwrap();
        let result = retrieve("gypsum board", &index, &KeywordRanker, 2).unwrap();
        let ids: Vec<String> = result.primary_ids().iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["9.3.2.1.", "9.10.1.1."]);
    }

    #[test]
    fn test_zero_score_sections_never_primary() {
        let index = index();
        let result = retrieve("masonry anchorage", &index, &KeywordRanker, 10).unwrap();
        assert!(result.hits.iter().all(|h| h.score > 0.0));
        let ceiling: SectionId = "9.5.3.1.".parse().unwrap();
        assert!(!result.primary_ids().contains(&ceiling));
    }

    #[test]
    fn test_k_zero_yields_empty_primary_set() {
        let index = index();
        let result = retrieve("masonry", &index, &KeywordRanker, 0).unwrap();
        assert!(result.hits.is_empty());
    }

    #[test]
    fn test_empty_index_is_an_error() {
        let index = DocumentIndex::load("No headings here.\n").unwrap();
        assert!(matches!(
            retrieve("masonry", &index, &KeywordRanker, 3),
            Err(AppError::EmptyIndex)
        ));
    }
}
