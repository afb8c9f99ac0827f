//! Text normalisation and informative-term extraction.
//!
//! Everything here is a pure `&str → value` function. The context
//! associator compares term sets produced by [`extract_terms`], so the
//! tokenisation rules must stay deterministic: same text, same set.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

/// Minimum character length for a token to count as an informative term.
pub const MIN_TERM_LEN: usize = 3;

/// English closed-class words plus filler that is frequent in article prose
/// and captions but says nothing about a particular artifact.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    // closed-class English
    "a", "about", "above", "after", "again", "against", "ain", "all", "am", "an", "and", "any",
    "are", "aren", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "couldn", "did", "didn", "do", "does", "doesn", "doing", "don",
    "down", "during", "each", "few", "for", "from", "further", "had", "hadn", "has", "hasn",
    "have", "haven", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his",
    "how", "i", "if", "in", "into", "is", "isn", "it", "its", "itself", "just", "ll", "ma", "me",
    "mightn", "more", "most", "mustn", "my", "myself", "needn", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "re", "same", "shan", "she", "should", "shouldn", "so", "some", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "ve", "very", "was", "wasn", "we", "were",
    "weren", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "won", "wouldn", "you", "your", "yours", "yourself", "yourselves", "also", "may", "might",
    "must", "would", "could", "shall", "within", "without", "among", "per", "via", "however",
    "thus", "therefore", "whereas", "although", "et", "al",
    // article filler
    "figure", "figures", "fig", "table", "tables", "shown", "show", "shows", "caption",
    "panel", "panels", "image", "images", "see", "supplementary", "data",
];

/// The default stop-word set as owned strings.
pub fn default_stop_words() -> HashSet<String> {
    DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect()
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Informative terms of `text`: lowercased, punctuation stripped, split on
/// whitespace, alphabetic, at least [`MIN_TERM_LEN`] characters, not a stop word.
pub fn extract_terms(text: &str, stop_words: &HashSet<String>) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    stripped
        .split_whitespace()
        .filter(|t| t.chars().all(char::is_alphabetic))
        .filter(|t| t.chars().count() >= MIN_TERM_LEN)
        .filter(|t| !stop_words.contains(*t))
        .map(str::to_string)
        .collect()
}

// ── Caption labels ───────────────────────────────────────────────────────

static RE_CAPTION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:table|figure|fig\.?)\s*(\d+)[a-z]?\s*(?:[:.]\s*|$)").unwrap()
});

static RE_LABEL_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").unwrap());

/// Split a leading "Table N:" / "Figure N." / "Fig. N" label off a caption.
///
/// The number must be followed by `:` or `.` or end the text, so prose such
/// as "Table 3 shows..." is left intact. Returns the label number, if any, and the remaining caption text.
pub fn split_label(caption: &str) -> (Option<u32>, &str) {
    match RE_CAPTION_LABEL.captures(caption) {
        Some(caps) => {
            let number = caps[1].parse().ok();
            let rest = caption[caps[0].len()..].trim();
            (number, rest)
        }
        None => (None, caption.trim()),
    }
}

/// First number in a label such as "Table 2" or "Fig. 3b".
pub fn label_number(label: &str) -> Option<u32> {
    RE_LABEL_NUMBER
        .captures(label)
        .and_then(|caps| caps[1].parse().ok())
}
