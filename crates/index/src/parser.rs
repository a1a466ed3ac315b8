//! Corpus parser for hierarchical building-code Markdown.
//!
//! The corpus is Markdown whose heading lines carry dotted section numbers
//! with a trailing dot ("9.20.11.6. Anchorage of Masonry Veneer"), optionally
//! prefixed with `#` marks and a "Section" label. The trailing dot is
//! required on bare heading lines to avoid false positives like "9.5 mm".
//!
//! Parsing is all-or-nothing: malformed numbering, duplicate identifiers and
//! unterminated tables abort the load with the offending line number, rather
//! than producing a partial index.

use crate::section::{Section, SectionId, Table};
use coderag_core::{AppError, AppResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Bare heading line: dotted number with trailing dot, at least two groups.
static BARE_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^((?:\d+\.){2,})\s+(\S.*)$").expect("valid regex"));

/// Hash-prefixed heading line; the numbering is validated separately so that
/// malformed numbers inside explicit headings fail the load.
static HASH_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s*(?:Section\s+)?(\S+)\s*(.*)$").expect("valid regex"));

/// Something that looks like a dotted number (used to decide whether an
/// unparseable heading token is malformed numbering or just a word).
static NUMBERISH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d[\d.]*$").expect("valid regex"));

/// Markdown table divider row (`| --- | :--- |`).
static TABLE_DIVIDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\|[\s:|\-]*-[\s:|\-]*\|?\s*$").expect("valid regex"));

/// Caption line announcing a table ("Table 9.20.2.1." with optional suffix).
static TABLE_CAPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bTable\s+(\d[\d.]*\.?(?:-[A-Z])?)").expect("valid regex"));

/// Page-number footer lines like "_**9-12**_".
static PAGE_FOOTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*_?\*{0,2}\d+-\d+\*{0,2}_?\s*$").expect("valid regex"));

/// Lines that are nothing but markdown decoration.
static DECORATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[#*_\-]+\s*$").expect("valid regex"));

/// A section heading found during the line scan.
struct RawSection {
    id: SectionId,
    title: String,
    /// 1-based line number of the heading
    line: usize,
    /// (1-based line number, text) for each body line
    body: Vec<(usize, String)>,
}

/// Parse a corpus into sections keyed by identifier.
///
/// Returns the sections in ascending-id order with tables lifted out of the
/// body text and breadcrumbs built from ancestor titles.
pub fn parse_corpus(corpus: &str) -> AppResult<BTreeMap<SectionId, Section>> {
    let raw_sections = scan_sections(corpus)?;
    tracing::debug!("Scanned {} section headings", raw_sections.len());

    let mut sections = BTreeMap::new();
    for raw in raw_sections {
        let heading_line = raw.line;
        let (body, tables) = extract_tables(&raw.id, raw.body)?;
        let section = Section {
            id: raw.id.clone(),
            title: raw.title,
            context_path: Vec::new(),
            body: clean_body(&body),
            tables,
        };
        // Duplicate ids would make lookups ambiguous; the load fails instead.
        if let Some(existing) = sections.insert(raw.id.clone(), section) {
            return Err(AppError::parse(
                heading_line,
                format!("duplicate section identifier {}", existing.id),
            ));
        }
    }

    build_breadcrumbs(&mut sections);
    Ok(sections)
}

/// First pass: split the corpus into heading-delimited raw sections.
fn scan_sections(corpus: &str) -> AppResult<Vec<RawSection>> {
    let mut raw_sections: Vec<RawSection> = Vec::new();

    for (idx, line) in corpus.lines().enumerate() {
        let line_no = idx + 1;

        if let Some(caps) = HASH_HEADING_RE.captures(line) {
            let token = &caps[1];
            let title = caps[2].trim();

            if NUMBERISH_RE.is_match(token) {
                let id = SectionId::from_str(token).map_err(|e| {
                    AppError::parse(line_no, format!("malformed section numbering: {}", e))
                })?;
                if id.depth() >= 2 {
                    if title.is_empty() {
                        return Err(AppError::parse(
                            line_no,
                            format!("section {} has no title", id),
                        ));
                    }
                    raw_sections.push(RawSection {
                        id,
                        title: title.to_string(),
                        line: line_no,
                        body: Vec::new(),
                    });
                }
                // Single-group headings ("# 9. Housing") are part headings,
                // not addressable sections.
                continue;
            }

            // Non-numbered hash headings are structural noise, drop them.
            continue;
        }

        if let Some(caps) = BARE_HEADING_RE.captures(line) {
            let id = SectionId::from_str(&caps[1]).map_err(|e| {
                AppError::parse(line_no, format!("malformed section numbering: {}", e))
            })?;
            raw_sections.push(RawSection {
                id,
                title: caps[2].trim().to_string(),
                line: line_no,
                body: Vec::new(),
            });
            continue;
        }

        if let Some(current) = raw_sections.last_mut() {
            current.body.push((line_no, line.to_string()));
        }
        // Lines before the first heading are front matter, ignored.
    }

    Ok(raw_sections)
}

/// Second pass: lift markdown tables out of a section body.
///
/// A table starts at a `|` line (the header row) and must be followed by a
/// divider row; anything else is an unterminated table and fails the load.
/// Caption lines directly above the table ("Table 9.20.2.1. Title") name the
/// table and are removed from the body along with the table block.
fn extract_tables(
    section_id: &SectionId,
    body: Vec<(usize, String)>,
) -> AppResult<(Vec<String>, Vec<Table>)> {
    let mut kept: Vec<String> = Vec::new();
    let mut tables: Vec<Table> = Vec::new();
    let mut i = 0;

    while i < body.len() {
        let (line_no, ref line) = body[i];

        if !is_table_row(line) {
            kept.push(line.clone());
            i += 1;
            continue;
        }

        // A stray divider with no header above is decoration, not a table.
        if TABLE_DIVIDER_RE.is_match(line) {
            i += 1;
            continue;
        }

        let header = line.clone();
        let divider = body.get(i + 1).map(|(_, l)| l.as_str());
        match divider {
            Some(d) if TABLE_DIVIDER_RE.is_match(d) => {}
            _ => {
                return Err(AppError::parse(
                    line_no,
                    format!("unterminated table in section {} (missing divider row)", section_id),
                ));
            }
        }

        let mut block = vec![header.clone(), body[i + 1].1.clone()];
        i += 2;
        while i < body.len() && is_table_row(&body[i].1) {
            block.push(body[i].1.clone());
            i += 1;
        }

        let (table_id, caption) = name_table(&mut kept, &header, tables.len());
        tables.push(Table {
            id: unique_table_id(&tables, table_id),
            caption,
            content: block.join("\n"),
        });
    }

    Ok((kept, tables))
}

fn is_table_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Determine a table's id and caption.
///
/// Preference order: a caption line within the few lines directly above the
/// table, then a "Table <num>" token in the header row, then a synthetic key
/// from the header snippet. Caption lines are consumed from the kept body.
fn name_table(kept: &mut Vec<String>, header: &str, ordinal: usize) -> (String, String) {
    // Look back over trailing blanks for a caption line.
    let mut cursor = kept.len();
    let mut scanned = 0usize;
    while cursor > 0 && scanned < 6 {
        let candidate = kept[cursor - 1].trim().to_string();
        if candidate.is_empty() {
            cursor -= 1;
            scanned += 1;
            continue;
        }
        if let Some(caps) = TABLE_CAPTION_RE.captures(&candidate) {
            let number = normalize_table_number(&caps[1]);
            let caption_end = caps.get(1).map(|m| m.end()).unwrap_or(0);
            let caption = clean_caption(&candidate[caption_end.min(candidate.len())..]);
            kept.truncate(cursor - 1);
            return (format!("Table {}", number), caption);
        }
        break;
    }

    // Header cell may carry the caption: "| Table 9.20.2.1. Sizes | ... |".
    if let Some(caps) = TABLE_CAPTION_RE.captures(header) {
        let number = normalize_table_number(&caps[1]);
        let caption_end = caps.get(1).map(|m| m.end()).unwrap_or(0);
        let caption = clean_caption(
            header[caption_end.min(header.len())..]
                .split('|')
                .next()
                .unwrap_or(""),
        );
        return (format!("Table {}", number), caption);
    }

    let snippet: String = header.trim_matches(['|', ' ']).chars().take(40).collect();
    (
        format!("Table: {}", if snippet.is_empty() { format!("unnamed {}", ordinal + 1) } else { snippet }),
        String::new(),
    )
}

/// Ensure a trailing dot on table numbers, preserving "-A" style suffixes.
fn normalize_table_number(raw: &str) -> String {
    match raw.rsplit_once('-') {
        Some((num, suffix)) if suffix.chars().all(|c| c.is_ascii_uppercase()) => {
            let num = num.trim_end_matches('.');
            format!("{}.-{}", num, suffix)
        }
        _ => {
            let num = raw.trim_end_matches('.');
            format!("{}.", num)
        }
    }
}

/// Strip markdown emphasis and leading punctuation from a caption.
fn clean_caption(raw: &str) -> String {
    let stripped: String = raw.replace(['*', '_'], "");
    stripped
        .trim_start_matches([' ', '.', '-', ':'])
        .trim()
        .to_string()
}

/// Make table keys unique within a section.
fn unique_table_id(existing: &[Table], base: String) -> String {
    if !existing.iter().any(|t| t.id == base) {
        return base;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{} ({})", base, counter);
        if !existing.iter().any(|t| t.id == candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Clean residual markdown noise out of a section body.
fn clean_body(lines: &[String]) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_run = 0usize;

    for line in lines {
        let trimmed = line.trim_end();
        if PAGE_FOOTER_RE.is_match(trimmed)
            || DECORATION_RE.is_match(trimmed)
            || (trimmed.starts_with('|') && trimmed.ends_with('|'))
        {
            continue;
        }
        if trimmed.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
            out.push("");
        } else {
            blank_run = 0;
            out.push(trimmed);
        }
    }

    out.join("\n").trim().to_string()
}

/// Third pass: fill in each section's breadcrumb from ancestor titles.
fn build_breadcrumbs(sections: &mut BTreeMap<SectionId, Section>) {
    let titles: BTreeMap<SectionId, String> = sections
        .iter()
        .map(|(id, s)| (id.clone(), s.title.clone()))
        .collect();

    for (id, section) in sections.iter_mut() {
        section.context_path = id
            .ancestors()
            .iter()
            .filter_map(|a| titles.get(a).cloned())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &str = "\
# 9. Housing and Small Buildings

## 9.20. Masonry and Insulating Concrete Form Walls

9.20.1. General Requirements

This subsection applies to unreinforced masonry.

9.20.2. Masonry Units

Masonry units shall conform to the standards listed below.

Table 9.20.2.1. Permitted Unit Sizes

| Unit | Width, mm | Height, mm |
| ---- | --------- | ---------- |
| Brick | 90 | 57 |
| Block | 190 | 190 |

Units shall be free of cracks.
";

    #[test]
    fn test_parses_sections_with_breadcrumbs() {
        let sections = parse_corpus(CORPUS).unwrap();
        assert_eq!(sections.len(), 3);

        let id: SectionId = "9.20.1.".parse().unwrap();
        let section = &sections[&id];
        assert_eq!(section.title, "General Requirements");
        assert_eq!(
            section.context_path,
            vec!["Masonry and Insulating Concrete Form Walls".to_string()]
        );
        assert!(section.body.contains("unreinforced masonry"));
    }

    #[test]
    fn test_lifts_tables_out_of_body() {
        let sections = parse_corpus(CORPUS).unwrap();
        let id: SectionId = "9.20.2.".parse().unwrap();
        let section = &sections[&id];

        assert_eq!(section.tables.len(), 1);
        let table = &section.tables[0];
        assert_eq!(table.id, "Table 9.20.2.1.");
        assert_eq!(table.caption, "Permitted Unit Sizes");
        assert!(table.content.contains("| Brick | 90 | 57 |"));

        // Neither the table rows nor the caption remain in the body
        assert!(!section.body.contains('|'));
        assert!(!section.body.contains("Permitted Unit Sizes"));
        assert!(section.body.contains("free of cracks"));
    }

    #[test]
    fn test_unterminated_table_fails_load() {
        let corpus = "\
9.20.2. Masonry Units

| Unit | Width |
no divider row here
";
        let err = parse_corpus(corpus).unwrap_err();
        match err {
            AppError::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("unterminated table"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_numbering_fails_load() {
        let corpus = "## 9..20. Broken Heading\n\nBody text.\n";
        let err = parse_corpus(corpus).unwrap_err();
        match err {
            AppError::Parse { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("malformed section numbering"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_heading_requires_trailing_dot() {
        // "9.5 mm" style measurements must not open a section
        let corpus = "9.5.3. Ceiling Heights\n\nBolts shall be at least\n9.5 mm in diameter.\n";
        let sections = parse_corpus(corpus).unwrap();
        assert_eq!(sections.len(), 1);
        let id: SectionId = "9.5.3.".parse().unwrap();
        assert!(sections[&id].body.contains("9.5 mm"));
    }

    #[test]
    fn test_duplicate_identifier_fails_load() {
        let corpus = "9.20.1. First\n\nBody.\n\n9.20.1. Second\n\nBody.\n";
        assert!(matches!(
            parse_corpus(corpus).unwrap_err(),
            AppError::Parse { .. }
        ));
    }

    #[test]
    fn test_page_footers_and_decoration_removed() {
        let corpus = "9.20.1. General\n\nReal content.\n\n_**9-12**_\n\n---\n\nMore content.\n";
        let sections = parse_corpus(corpus).unwrap();
        let id: SectionId = "9.20.1.".parse().unwrap();
        let body = &sections[&id].body;
        assert!(body.contains("Real content."));
        assert!(body.contains("More content."));
        assert!(!body.contains("9-12"));
        assert!(!body.contains("---"));
    }
}
