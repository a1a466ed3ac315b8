//! Cross-reference resolver.
//!
//! Scans section bodies for the citation patterns used throughout the code:
//!
//! - labelled citations: "Article 9.20.5.1.", "Sentence 9.15.2.3.(4)"
//! - table citations: "Table 9.23.3.4.", "Tables 9.10.3.1. and 9.10.3.2."
//! - continuation lists: "Articles 9.20.5.1. and 9.20.5.2."
//! - loose citations: "(see 9.20.10.)"
//! - bare sub-clause citations: "Clause (1)(a)", anchored to the nearest
//!   preceding Sentence citation in the same body
//!
//! Targets that do not exist in the index are marked unresolved rather than
//! failing the query. Self-references, ancestor references and references to
//! a section's own tables are discarded. Extraction is a pure function of
//! the section text and index, so re-running it yields the same set.

use crate::index::DocumentIndex;
use crate::section::{Section, SectionId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::str::FromStr;

/// Labelled citation: label word, dotted number (2-4 groups), optional
/// parenthesised sub-locator suffix.
static LABELED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(Articles?|Sections?|Subsections?|Subclauses?|Clauses?|Sentences?)\s+((?:\d+\.){2,4})((?:\([0-9A-Za-z]{1,4}\))*)",
    )
    .expect("valid regex")
});

/// Table citation, including "or"/"and" joined lists and "-A" suffixes.
static TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bTables?\s+((?:\d+\.){2,4}(?:-[A-Z])?(?:\s+(?:or|and)\s+(?:\d+\.){2,4}(?:-[A-Z])?)*)",
    )
    .expect("valid regex")
});

/// Loose citation near "see" or an opening parenthesis.
static LOOSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\bsee(?:\s+also)?\s+|\()\s*((?:\d+\.){2,4})").expect("valid regex"));

/// Bare clause citation with no dotted number ("Clause (1)(a)").
static BARE_CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bClauses?\s+((?:\([0-9A-Za-z]{1,4}\))+)").expect("valid regex"));

/// A dotted number anywhere (used inside table citation lists).
static NUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\d+\.){2,4}").expect("valid regex"));

/// Immediate list continuation after a citation (", 9.20.5.2." / "and 9.20.5.2.").
static CONT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?:,|;|or|and)\s*)+((?:\d+\.){2,4})").expect("valid regex")
});

/// Resolution result for a single citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RefTarget {
    /// Target exists in the index. The locator retains the sub-clause or
    /// table designation for display ("(4)", "Table 9.20.5.1.").
    Resolved {
        id: SectionId,
        locator: Option<String>,
    },

    /// Target could not be resolved against the index.
    Unresolved { raw: String },
}

/// A citation extracted from a section body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Citing section
    pub source: SectionId,

    /// Cited target
    pub target: RefTarget,
}

impl Reference {
    /// Resolved target id, if any.
    pub fn resolved_id(&self) -> Option<&SectionId> {
        match &self.target {
            RefTarget::Resolved { id, .. } => Some(id),
            RefTarget::Unresolved { .. } => None,
        }
    }
}

/// What a raw citation pointed at, before index resolution.
#[derive(Debug)]
enum Candidate {
    /// Dotted section number with optional sub-locator
    SectionRef {
        number: String,
        locator: Option<String>,
    },
    /// Table number (trailing dot normalized, "-A" suffix preserved)
    TableRef { number: String },
    /// Bare clause groups with an optional anchoring Sentence citation
    ClauseRef {
        groups: String,
        anchor: Option<(SectionId, Option<String>)>,
    },
}

/// Extract and resolve all citations in a section's body.
///
/// Output preserves first-occurrence order and is de-duplicated by target.
pub fn extract_references(section: &Section, index: &DocumentIndex) -> Vec<Reference> {
    let text = section.body.as_str();
    if text.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<(usize, Candidate)> = Vec::new();

    // Table citations first: their numbers must not double as section
    // citations in the later passes.
    let mut table_numbers: HashSet<String> = HashSet::new();
    for caps in TABLE_RE.captures_iter(text) {
        let list = caps.get(1).expect("table citation list");
        for num in NUM_RE.find_iter(list.as_str()) {
            let mut number = num.as_str().to_string();
            // Re-attach a "-A" style suffix if one follows immediately
            let rest = &list.as_str()[num.end()..];
            if let Some(suffix) = rest.strip_prefix('-').and_then(|r| {
                let s: String = r.chars().take_while(|c| c.is_ascii_uppercase()).collect();
                if s.is_empty() {
                    None
                } else {
                    Some(s)
                }
            }) {
                number = format!("{}-{}", number, suffix);
            }
            table_numbers.insert(bare_number(&number));
            candidates.push((list.start() + num.start(), Candidate::TableRef { number }));
        }
    }

    // Labelled citations, remembering Sentence citations as anchors for
    // bare clause references further down the body.
    let mut sentence_anchors: Vec<(usize, SectionId, Option<String>)> = Vec::new();
    for caps in LABELED_RE.captures_iter(text) {
        let label = caps.get(1).expect("label").as_str();
        let num = caps.get(2).expect("number");
        let locator = caps.get(3).filter(|m| !m.as_str().is_empty());

        if !table_numbers.contains(num.as_str()) {
            candidates.push((
                num.start(),
                Candidate::SectionRef {
                    number: num.as_str().to_string(),
                    locator: locator.map(|m| m.as_str().to_string()),
                },
            ));
        }

        if label.to_ascii_lowercase().starts_with("sentence") {
            if let Ok(id) = SectionId::from_str(num.as_str()) {
                if id != section.id && index.contains(&id) {
                    sentence_anchors.push((
                        num.start(),
                        id,
                        locator.map(|m| m.as_str().to_string()),
                    ));
                }
            }
        }

        let match_end = caps.get(0).expect("match").end();
        for (offset, number) in scan_continuations(&text[match_end..]) {
            if !table_numbers.contains(number.as_str()) {
                candidates.push((
                    match_end + offset,
                    Candidate::SectionRef {
                        number,
                        locator: None,
                    },
                ));
            }
        }
    }

    // Loose citations ("see 9.20.", "(9.27.)") and their list continuations.
    for caps in LOOSE_RE.captures_iter(text) {
        let num = caps.get(1).expect("loose number");
        if !table_numbers.contains(num.as_str()) {
            candidates.push((
                num.start(),
                Candidate::SectionRef {
                    number: num.as_str().to_string(),
                    locator: None,
                },
            ));
        }
        for (offset, number) in scan_continuations(&text[num.end()..]) {
            if !table_numbers.contains(number.as_str()) {
                candidates.push((
                    num.end() + offset,
                    Candidate::SectionRef {
                        number,
                        locator: None,
                    },
                ));
            }
        }
    }

    // Bare clause citations anchor to the nearest preceding Sentence citation.
    for caps in BARE_CLAUSE_RE.captures_iter(text) {
        let groups = caps.get(1).expect("clause groups");
        let anchor = sentence_anchors
            .iter()
            .rev()
            .find(|(pos, _, _)| *pos < groups.start())
            .map(|(_, id, locator)| (id.clone(), locator.clone()));
        candidates.push((
            groups.start(),
            Candidate::ClauseRef {
                groups: groups.as_str().to_string(),
                anchor,
            },
        ));
    }

    candidates.sort_by_key(|(pos, _)| *pos);
    resolve_candidates(section, index, candidates)
}

/// Resolve candidates against the index, filter, and de-duplicate.
fn resolve_candidates(
    section: &Section,
    index: &DocumentIndex,
    candidates: Vec<(usize, Candidate)>,
) -> Vec<Reference> {
    let own_tables: HashSet<&str> = section.tables.iter().map(|t| t.id.as_str()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<Reference> = Vec::new();

    for (_pos, candidate) in candidates {
        let target = match candidate {
            Candidate::SectionRef { number, locator } => {
                let id = match SectionId::from_str(&number) {
                    Ok(id) => id,
                    // Digits-and-dots matches always parse
                    Err(_) => continue,
                };
                if id == section.id || section.id.is_descendant_of(&id) {
                    continue;
                }
                if index.contains(&id) {
                    RefTarget::Resolved { id, locator }
                } else {
                    RefTarget::Unresolved {
                        raw: format!("{}{}", number, locator.unwrap_or_default()),
                    }
                }
            }

            Candidate::TableRef { number } => {
                let table_key = format!("Table {}", number);
                if own_tables.contains(table_key.as_str()) {
                    continue;
                }
                if let Some(owner) = index.table_owner(&table_key) {
                    if *owner == section.id || section.id.is_descendant_of(owner) {
                        continue;
                    }
                    RefTarget::Resolved {
                        id: owner.clone(),
                        locator: Some(table_key),
                    }
                } else if let Ok(id) = SectionId::from_str(bare_number(&number).as_str()) {
                    // No such table, but the number may address a section
                    if id == section.id || section.id.is_descendant_of(&id) {
                        continue;
                    }
                    if index.contains(&id) {
                        RefTarget::Resolved {
                            id,
                            locator: Some(table_key),
                        }
                    } else {
                        RefTarget::Unresolved { raw: table_key }
                    }
                } else {
                    RefTarget::Unresolved { raw: table_key }
                }
            }

            Candidate::ClauseRef { groups, anchor } => match anchor {
                Some((id, sentence_locator)) => {
                    let locator = format!("{}{}", sentence_locator.unwrap_or_default(), groups);
                    RefTarget::Resolved {
                        id,
                        locator: Some(locator),
                    }
                }
                // No Sentence in scope: unresolved, never guessed
                None => RefTarget::Unresolved {
                    raw: format!("Clause {}", groups),
                },
            },
        };

        let key = match &target {
            RefTarget::Resolved { id, locator } => {
                format!("{}{}", id, locator.as_deref().unwrap_or(""))
            }
            RefTarget::Unresolved { raw } => raw.clone(),
        };
        if seen.insert(key) {
            out.push(Reference {
                source: section.id.clone(),
                target,
            });
        }
    }

    out
}

/// Immediate ", 9.20.5.2." / "and 9.20.5.2." continuations after a citation.
/// Returns (byte offset into the tail, dotted number).
fn scan_continuations(tail: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut offset = 0usize;

    while offset < tail.len() && offset < 200 {
        let Some(caps) = CONT_RE.captures(&tail[offset..]) else {
            break;
        };
        let num = caps.get(1).expect("continuation number");
        out.push((offset + num.start(), num.as_str().to_string()));
        offset += caps.get(0).expect("continuation match").end();
    }

    out
}

/// Strip a "-A" style table suffix, keeping the dotted number.
fn bare_number(number: &str) -> String {
    match number.split_once('-') {
        Some((num, _)) => num.to_string(),
        None => number.to_string(),
    }
}
