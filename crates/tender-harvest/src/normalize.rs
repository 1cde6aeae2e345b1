//! Canonical form for extracted company names.
//!
//! `normalize` is total and idempotent: applying it to its own output is a
//! no-op. The label and dedupe helpers operate on the lines fed into it.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex is valid"))
}

fn periods_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.{2,}").expect("periods regex is valid"))
}

fn abbreviation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(pte|ltd)\b\.?").expect("abbreviation regex is valid"))
}

fn abbreviation_gap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(pte|ltd)\.\s*").expect("abbreviation gap regex is valid"))
}

fn comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*,\s*").expect("comma regex is valid"))
}

// Optional "successful"/"name of" prefix, a role word, then a ':' or '-' separator.
fn role_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:name\s+of\s+(?:the\s+)?)?(?:successful\s+|other\s+|participating\s+)*(?:tenderers?|bidders?|participants?|winners?|awardees?)(?:\s+names?)?\s*(?:[:\-\u{2013}\u{2014}]\s*)",
        )
        .expect("role label regex is valid")
    })
}

fn list_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\(?\d{1,3}[.)]\s*").expect("list marker regex is valid"))
}

fn bare_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:name\s+of\s+(?:the\s+)?)?(?:successful\s+|other\s+|participating\s+)*(?:tenderers?|bidders?|participants?|winners?|awardees?)(?:\s+names?)?\s*[:\-]?$",
        )
        .expect("bare label regex is valid")
    })
}

/// Canonicalize a company-name string.
///
/// Collapses whitespace, writes `Pte`/`Ltd` with a trailing period, puts
/// exactly one space after each comma and collapses runs of periods.
pub fn normalize(raw: &str) -> String {
    let s = collapse_whitespace(raw);
    if s.is_empty() {
        return s;
    }
    let s = periods_re().replace_all(&s, ".");
    let s = abbreviation_re().replace_all(&s, "$1.");
    let s = abbreviation_gap_re().replace_all(&s, "$1. ");
    let s = comma_re().replace_all(&s, ", ");
    let s = periods_re().replace_all(&s, ".");
    collapse_whitespace(&s)
}

fn collapse_whitespace(s: &str) -> String {
    whitespace_re().replace_all(s, " ").trim().to_string()
}

/// Strip a leading role label ("Tenderer:", "Bidder -") and any leading
/// numeric list marker ("1.", "2)").
pub fn strip_role_label(line: &str) -> String {
    let mut current = line.trim().to_string();
    // Markers and labels can appear in either order ("1. Bidder: X", "Bidder: 1. X").
    loop {
        let without_marker = list_marker_re().replace(&current, "").to_string();
        let without_label = role_label_re().replace(&without_marker, "").to_string();
        if without_label == current {
            return current.trim().to_string();
        }
        current = without_label;
    }
}

/// True for lines that consist of a role label only ("Successful Tenderer").
pub fn is_bare_label(line: &str) -> bool {
    bare_label_re().is_match(line.trim())
}

/// Remove exact duplicates, keeping the first occurrence of each item.
pub fn dedupe_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
