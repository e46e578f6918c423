//! Candidate-term extraction: the pure first layer of the detector.
//!
//! Extraction keys on the three shapes invented terms take in generated
//! text: Title-Case runs, quoted terms introduced by a medical trigger word,
//! and mixed-case compounds ("BloodHarmony").

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Consecutive Title-Case words ("Fictitious Syndrome").
static TITLE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").unwrap());

/// Anything in single or double quotes.
static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());

/// Internal capitalization ("BloodHarmony").
static MIXED_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+[A-Z][a-z]+\b").unwrap());

/// Words that make a preceding quote medically meaningful.
const TRIGGER_WORDS: &[&str] = &["drug", "medication", "syndrome", "disease", "test", "condition"];

/// How far back (in bytes) a trigger word may sit before a quoted term.
const TRIGGER_WINDOW: usize = 50;

/// English words a Title-Case match may start a sentence with.
const COMMON_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "is", "are", "was", "were", "i", "you", "he", "she",
    "it", "we", "they", "this", "that", "these", "those", "what", "which", "who", "how", "where",
    "when", "why", "should", "could", "would", "may", "might", "must", "will", "can", "has",
    "have", "had", "do", "does", "did", "been", "be", "about", "of", "in", "to", "for", "with",
    "from", "as", "by",
];

/// Extract every candidate medical term from `text`, deduplicated and in
/// deterministic (sorted) order.
pub fn extract_candidate_terms(text: &str) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();
    let text_lower = text.to_lowercase();

    for m in TITLE_CASE.find_iter(text) {
        let term = m.as_str();
        if term.len() > 2 && !is_common_word(term) {
            terms.insert(term.to_string());
        }
    }

    for caps in QUOTED.captures_iter(text) {
        let Some(inner) = caps.get(1) else { continue };
        let Some(whole) = caps.get(0) else { continue };
        if window_before(&text_lower, whole.start())
            .map(|w| TRIGGER_WORDS.iter().any(|t| w.contains(t)))
            .unwrap_or(false)
        {
            terms.insert(inner.as_str().to_string());
        }
    }

    for m in MIXED_CASE.find_iter(text) {
        terms.insert(m.as_str().to_string());
    }

    terms
}

/// Up to `TRIGGER_WINDOW` bytes of lowercased text preceding `start`,
/// clamped to a char boundary.
fn window_before(text_lower: &str, start: usize) -> Option<&str> {
    let mut from = start.saturating_sub(TRIGGER_WINDOW);
    while from < start && !text_lower.is_char_boundary(from) {
        from += 1;
    }
    text_lower.get(from..start)
}

fn is_common_word(term: &str) -> bool {
    let lower = term.to_lowercase();
    COMMON_WORDS.contains(&lower.as_str())
}

// ── Tests ────────────────────────────────────────────────────────────────────
