//! Section and table types for the document index.
//!
//! A `SectionId` is the dotted numeric path that addresses a unit of the
//! code, always displayed with a trailing dot ("9.20.11.6."). Ordering is
//! numeric per component, so "9.9." sorts before "9.10.".

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Dotted numeric section identifier.
///
/// Identifiers are unique within an index and order by their numeric
/// components, which matches the hierarchy: a parent always sorts before
/// its subsections.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionId(Vec<u32>);

impl SectionId {
    /// Build an id from numeric components.
    pub fn new(parts: Vec<u32>) -> Self {
        Self(parts)
    }

    /// Numeric components of the id.
    pub fn parts(&self) -> &[u32] {
        &self.0
    }

    /// Nesting depth, i.e. the number of dotted groups.
    /// "9.1." has depth 2, "9.20.11.6." has depth 4.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Parent section id, or `None` for top-level sections.
    ///
    /// Two-group ids like "9.1." are top-level: the bare part number ("9.")
    /// is not an addressable section.
    pub fn parent(&self) -> Option<SectionId> {
        if self.0.len() <= 2 {
            return None;
        }
        Some(SectionId(self.0[..self.0.len() - 1].to_vec()))
    }

    /// All ancestor ids with at least two groups, shallowest first.
    /// For "9.33.8.4." this yields "9.33." and "9.33.8.".
    pub fn ancestors(&self) -> Vec<SectionId> {
        (2..self.0.len())
            .map(|n| SectionId(self.0[..n].to_vec()))
            .collect()
    }

    /// True if `other` is a strict ancestor of this id.
    pub fn is_descendant_of(&self, other: &SectionId) -> bool {
        other.0.len() < self.0.len() && self.0[..other.0.len()] == other.0[..]
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.0 {
            write!(f, "{}.", part)?;
        }
        Ok(())
    }
}

impl FromStr for SectionId {
    type Err = String;

    /// Parse a dotted identifier, with or without the trailing dot.
    ///
    /// Rejects empty groups ("9..20.") and non-numeric groups.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('.');
        if trimmed.is_empty() {
            return Err(format!("empty section identifier: {:?}", s));
        }

        let parts: Result<Vec<u32>, _> = trimmed
            .split('.')
            .map(|p| {
                if p.is_empty() {
                    Err(format!("empty group in section identifier: {:?}", s))
                } else {
                    p.parse::<u32>()
                        .map_err(|_| format!("non-numeric group {:?} in identifier {:?}", p, s))
                }
            })
            .collect();

        Ok(SectionId(parts?))
    }
}

impl Serialize for SectionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SectionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// An addressable unit of the code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Dotted numeric identifier (e.g. "9.20.11.6.")
    pub id: SectionId,

    /// Heading title
    pub title: String,

    /// Breadcrumb of enclosing headings, shallowest first.
    /// Built from ancestor titles present in the index.
    pub context_path: Vec<String>,

    /// Body text with tables lifted out
    pub body: String,

    /// Tables that appeared within this section's body, verbatim
    pub tables: Vec<Table>,
}

impl Section {
    /// Breadcrumb rendered as "Part 9 > Masonry > Anchorage".
    pub fn breadcrumb(&self) -> String {
        self.context_path.join(" > ")
    }
}

/// A table embedded within a section.
///
/// Tables are opaque for retrieval but preserved verbatim in assembled
/// context, since the answer often lives in a table cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Table key (e.g. "Table 9.20.2.1.")
    pub id: String,

    /// Caption text, may be empty
    pub caption: String,

    /// Verbatim markdown table block
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_round_trip() {
        let id: SectionId = "9.20.11.6.".parse().unwrap();
        assert_eq!(id.to_string(), "9.20.11.6.");
        assert_eq!(id.parts(), &[9, 20, 11, 6]);

        // Trailing dot is optional on input, canonical on output
        let id2: SectionId = "9.20.11.6".parse().unwrap();
        assert_eq!(id, id2);
    }

    #[test]
    fn test_rejects_malformed_identifiers() {
        assert!("".parse::<SectionId>().is_err());
        assert!("9..20.".parse::<SectionId>().is_err());
        assert!("9.a.1.".parse::<SectionId>().is_err());
        assert!("...".parse::<SectionId>().is_err());
    }

    #[test]
    fn test_numeric_ordering() {
        let a: SectionId = "9.9.".parse().unwrap();
        let b: SectionId = "9.10.".parse().unwrap();
        assert!(a < b, "numeric components must not compare lexically");

        let parent: SectionId = "9.20.".parse().unwrap();
        let child: SectionId = "9.20.1.".parse().unwrap();
        assert!(parent < child, "a parent sorts before its subsections");
    }

    #[test]
    fn test_parent_and_ancestors() {
        let id: SectionId = "9.33.8.4.".parse().unwrap();
        assert_eq!(id.parent().unwrap().to_string(), "9.33.8.");
        let ancestors: Vec<String> = id.ancestors().iter().map(|a| a.to_string()).collect();
        assert_eq!(ancestors, vec!["9.33.", "9.33.8."]);

        let top: SectionId = "9.1.".parse().unwrap();
        assert!(top.parent().is_none());
        assert!(top.ancestors().is_empty());
    }

    #[test]
    fn test_descendant_check() {
        let child: SectionId = "9.20.11.6.".parse().unwrap();
        let ancestor: SectionId = "9.20.".parse().unwrap();
        let sibling: SectionId = "9.21.".parse().unwrap();

        assert!(child.is_descendant_of(&ancestor));
        assert!(!child.is_descendant_of(&sibling));
        assert!(!child.is_descendant_of(&child));
    }

    #[test]
    fn test_serde_as_string() {
        let id: SectionId = "9.15.2.3.".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"9.15.2.3.\"");
        let back: SectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
