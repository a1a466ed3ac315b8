//! Ranker strategies for query-to-section relevance.
//!
//! Ranking is a strategy seam: the retriever only needs a relevance score
//! per section, so keyword, trigram or external rankers can be swapped
//! without touching assembly logic. Scores are non-negative; zero means no
//! overlap with the query at all.

use coderag_core::{AppError, AppResult};
use coderag_index::Section;
use std::collections::{HashMap, HashSet};

/// Common English stop words, filtered before scoring.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "shall", "not", "than", "when", "where",
];

/// Relevance scoring strategy.
///
/// Implementations must be deterministic: identical (query, section) pairs
/// yield identical scores.
pub trait Ranker: Send + Sync {
    /// Strategy name (e.g. "keyword", "trigram").
    fn name(&self) -> &'static str;

    /// Non-negative relevance of a section to the query.
    fn score(&self, query: &str, section: &Section) -> f32;
}

/// Create a ranker by strategy name.
pub fn ranker_for(name: &str) -> AppResult<Box<dyn Ranker>> {
    match name.to_lowercase().as_str() {
        "keyword" => Ok(Box::new(KeywordRanker)),
        "trigram" => Ok(Box::new(TrigramRanker)),
        other => Err(AppError::Retrieval(format!(
            "Unknown ranker strategy: {}",
            other
        ))),
    }
}

/// Split text into lowercase terms, dropping stop words and short tokens.
fn terms(text: &str) -> Vec<String> {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !stop.contains(w))
        .map(|w| w.to_string())
        .collect()
}

/// Stop-word-filtered term overlap, with title matches weighted over body
/// matches and the score normalized by the query vocabulary size.
pub struct KeywordRanker;

impl Ranker for KeywordRanker {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn score(&self, query: &str, section: &Section) -> f32 {
        let query_terms: HashSet<String> = terms(query).into_iter().collect();
        if query_terms.is_empty() {
            return 0.0;
        }

        let title_terms: HashSet<String> = terms(&section.title).into_iter().collect();
        let body_terms: HashSet<String> = terms(&section.body).into_iter().collect();

        let mut hits = 0.0f32;
        for term in &query_terms {
            if title_terms.contains(term) {
                hits += 2.0;
            } else if body_terms.contains(term) {
                hits += 1.0;
            }
        }

        hits / (2.0 * query_terms.len() as f32)
    }
}

/// Cosine similarity over hashed character-trigram bag vectors.
///
/// Words are decomposed into character trigrams hashed onto a fixed-size
/// vector, with sqrt-scaled frequencies, plus a whole-word hash. Catches
/// inflected forms ("anchored"/"anchorage") that exact overlap misses.
pub struct TrigramRanker;

/// Embedding dimension for the hashed trigram vectors.
const TRIGRAM_DIM: usize = 384;

impl TrigramRanker {
    fn embed(text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; TRIGRAM_DIM];

        let mut word_freq: HashMap<String, u32> = HashMap::new();
        for word in terms(text) {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for i in 0..chars.len().saturating_sub(2) {
                let trigram = format!("{}{}{}", chars[i], chars[i + 1], chars[i + 2]);
                let trigram_hash = trigram
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));
                let dim_idx = (trigram_hash as usize) % TRIGRAM_DIM;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let base_dim = (word_hash as usize) % TRIGRAM_DIM;
            embedding[base_dim] += *freq as f32;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }
}

impl Ranker for TrigramRanker {
    fn name(&self) -> &'static str {
        "trigram"
    }

    fn score(&self, query: &str, section: &Section) -> f32 {
        let query_vec = Self::embed(query);
        let section_text = format!("{} {}", section.title, section.body);
        let section_vec = Self::embed(&section_text);
        Self::cosine(&query_vec, &section_vec).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderag_index::SectionId;

    fn section(id: &str, title: &str, body: &str) -> Section {
        Section {
            id: id.parse::<SectionId>().unwrap(),
            title: title.to_string(),
            context_path: Vec::new(),
            body: body.to_string(),
            tables: Vec::new(),
        }
    }

    #[test]
    fn test_keyword_prefers_title_matches() {
        let ranker = KeywordRanker;
        let title_hit = section("9.20.11.6.", "Anchorage of Masonry", "Other text entirely.");
        let body_hit = section("9.15.2.3.", "Piers", "Anchorage of masonry is described here.");

        let q = "masonry anchorage";
        assert!(ranker.score(q, &title_hit) > ranker.score(q, &body_hit));
        assert!(ranker.score(q, &body_hit) > 0.0);
    }

    #[test]
    fn test_keyword_zero_for_no_overlap() {
        let ranker = KeywordRanker;
        let s = section("9.5.3.1.", "Ceiling Heights", "Rooms shall have ceiling heights.");
        assert_eq!(ranker.score("masonry mortar joints", &s), 0.0);
    }

    #[test]
    fn test_keyword_deterministic() {
        let ranker = KeywordRanker;
        let s = section("9.20.1.1.", "Application", "Masonry walls and piers.");
        let a = ranker.score("masonry piers", &s);
        let b = ranker.score("masonry piers", &s);
        assert_eq!(a, b);
    }

    #[test]
    fn test_trigram_catches_inflected_forms() {
        let ranker = TrigramRanker;
        let s = section(
            "9.20.11.6.",
            "Anchorage",
            "Masonry shall be anchored to the supporting structure.",
        );
        let unrelated = section("9.5.3.1.", "Ceiling Heights", "Rooms shall have clear height.");

        let q = "anchoring masonry";
        assert!(ranker.score(q, &s) > ranker.score(q, &unrelated));
    }

    #[test]
    fn test_trigram_score_bounds() {
        let ranker = TrigramRanker;
        let s = section("9.20.1.1.", "Masonry", "Masonry units and mortar.");
        let score = ranker.score("masonry mortar", &s);
        assert!(score > 0.0);
        assert!(score <= 1.0 + f32::EPSILON);
    }

    #[test]
    fn test_ranker_factory() {
        assert_eq!(ranker_for("keyword").unwrap().name(), "keyword");
        assert_eq!(ranker_for("TRIGRAM").unwrap().name(), "trigram");
        assert!(ranker_for("neural").is_err());
    }
}
