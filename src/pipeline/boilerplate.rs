//! Boilerplate removal and paragraph collection.
//!
//! Web pages arrive wrapped in site chrome: banners, navigation, footers,
//! sidebars. When a page-level wrapper is present those regions are removed
//! while the HTML tree is lowered, the article root is picked from an ordered
//! list of content landmarks, and only then are paragraphs collected.

use crate::config::{parse_selector, ExtractionConfig};
use crate::error::ExtractError;
use crate::pipeline::dom::{Dom, NodeId};
use crate::pipeline::parse::lower_html;
use crate::pipeline::text::extract_terms;
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};

/// Compiled selector and pattern lists from [`ExtractionConfig`].
#[derive(Debug, Clone)]
pub struct BoilerplateFilter {
    excluded: Vec<Selector>,
    content_roots: Vec<Selector>,
    disclaimers: Vec<String>,
}

impl BoilerplateFilter {
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let excluded = config
            .excluded_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;
        let content_roots = config
            .content_root_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            excluded,
            content_roots,
            disclaimers: config.disclaimer_patterns.clone(),
        })
    }

    /// Lower `html` without its chrome regions and locate the article root.
    ///
    /// The root is the first surviving element matching the first content
    /// selector that matches anything; the whole document otherwise.
    pub fn filter_html(&self, html: &Html) -> (Dom, NodeId) {
        let (dom, hits) = lower_html(html, &self.excluded, &self.content_roots);
        let root = hits.into_iter().flatten().next().unwrap_or_else(|| dom.root());
        (dom, root)
    }

    /// `true` if `text` contains a disclaimer pattern.
    pub fn is_disclaimer(&self, text: &str) -> bool {
        self.disclaimers.iter().any(|p| text.contains(p.as_str()))
    }
}

/// One cleaned article paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    /// Ancestors, innermost first.
    pub enclosing: Vec<NodeId>,
    /// Target ids of structural cross-references (`xref/@rid`, `a[href^="#"]`).
    pub references: Vec<String>,
    pub terms: BTreeSet<String>,
}

/// Article paragraphs in document order.
#[derive(Debug, Clone, Default)]
pub struct ParagraphSet {
    paragraphs: Vec<Paragraph>,
}

impl ParagraphSet {
    pub fn iter(&self) -> impl Iterator<Item = &Paragraph> {
        self.paragraphs.iter()
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// `true` if any paragraph links to one of `anchors`.
    pub fn references_any(&self, anchors: &[String]) -> bool {
        self.paragraphs
            .iter()
            .any(|p| p.references.iter().any(|r| anchors.contains(r)))
    }
}

/// Collect the `p` elements under `root`.
///
/// Paragraphs empty after normalisation or matching a disclaimer pattern are
/// skipped. Caption paragraphs are kept; the associator keeps each artifact
/// from matching its own.
pub fn collect_paragraphs(
    dom: &Dom,
    root: NodeId,
    filter: &BoilerplateFilter,
    stop_words: &HashSet<String>,
) -> ParagraphSet {
    let paragraphs = dom
        .find_all(root, &["p"])
        .filter_map(|p| {
            let text = dom.text(p);
            if text.is_empty() || filter.is_disclaimer(&text) {
                return None;
            }
            let terms = extract_terms(&text, stop_words);
            Some(Paragraph {
                enclosing: dom.ancestors(p).collect(),
                references: cross_references(dom, p),
                text,
                terms,
            })
        })
        .collect();
    ParagraphSet { paragraphs }
}

fn cross_references(dom: &Dom, p: NodeId) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    for d in dom.descendants(p) {
        let targets: Vec<&str> = if dom.is(d, &["xref"]) {
            dom.attr(d, "rid")
                .map(|r| r.split_whitespace().collect())
                .unwrap_or_default()
        } else if dom.is(d, &["a"]) {
            dom.attr(d, "href")
                .and_then(|h| h.trim().strip_prefix('#'))
                .filter(|t| !t.is_empty())
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };
        for t in targets {
            if !refs.iter().any(|r| r == t) {
                refs.push(t.to_string());
            }
        }
    }
    refs
}
