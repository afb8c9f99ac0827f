//! Context association: citing and contextual paragraphs per artifact.
//!
//! A paragraph cites an artifact when it carries a cross-reference to one of
//! the artifact's anchor ids. When no paragraph links to this artifact (it
//! has no id, or nothing references it) the textual tests take over: a "Figure N" / "Table N" mention with the
//! artifact's number, or the literal asset file name.
//!
//! Every remaining paragraph sharing at least `min_terms` informative terms
//! with the artifact is contextual. Paragraphs inside the artifact's own
//! region, or repeating its caption, are never associated with it.

use crate::output::ContextualParagraph;
use crate::pipeline::boilerplate::{Paragraph, ParagraphSet};
use crate::pipeline::dom::NodeId;
use crate::pipeline::locate::CandidateKind;
use crate::pipeline::text::{extract_terms, split_label};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

static RE_FIGURE_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:figures?|figs?\.?)\s*(\d+)").unwrap());
static RE_TABLE_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\btables?\s*(\d+)").unwrap());

/// What the associator needs to know about one artifact.
#[derive(Debug, Clone)]
pub struct ArtifactKey<'a> {
    pub kind: CandidateKind,
    /// Number from the label or caption, else the ordinal.
    pub number: u32,
    pub anchors: &'a [String],
    /// File name of the resolved asset (images only).
    pub file_name: Option<&'a str>,
    pub terms: &'a BTreeSet<String>,
    /// The artifact's container, or the artifact node itself.
    pub region: Option<NodeId>,
    /// Resolved caption, label already stripped.
    pub caption: &'a str,
}

impl ArtifactKey<'_> {
    fn owns(&self, p: &Paragraph) -> bool {
        self.region.is_some_and(|r| p.enclosing.contains(&r))
            || (!self.caption.is_empty() && split_label(&p.text).1 == self.caption)
    }
}

/// Paragraphs associated with one artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Association {
    pub citing: Vec<String>,
    pub contextual: Vec<ContextualParagraph>,
}

/// Informative terms of an artifact: union of the terms of each text part.
pub fn informative_terms(parts: &[&str], stop_words: &HashSet<String>) -> BTreeSet<String> {
    parts
        .iter()
        .flat_map(|p| extract_terms(p, stop_words))
        .collect()
}

/// Classify every paragraph against `key`.
///
/// Both lists keep document order and drop byte-identical repeats; a
/// paragraph text that is citing never reappears as contextual.
pub fn associate(paragraphs: &ParagraphSet, key: &ArtifactKey<'_>, min_terms: usize) -> Association {
    let textual = !paragraphs.references_any(key.anchors);

    let mut out = Association::default();
    let mut citing_seen: HashSet<&str> = HashSet::new();
    for p in paragraphs.iter().filter(|p| !key.owns(p)) {
        if is_citing(p, key, textual) && citing_seen.insert(p.text.as_str()) {
            out.citing.push(p.text.clone());
        }
    }

    let mut contextual_seen: HashSet<&str> = HashSet::new();
    for p in paragraphs.iter().filter(|p| !key.owns(p)) {
        if citing_seen.contains(p.text.as_str()) || contextual_seen.contains(p.text.as_str()) {
            continue;
        }
        let shared: BTreeSet<String> = p.terms.intersection(key.terms).cloned().collect();
        if shared.len() >= min_terms {
            contextual_seen.insert(p.text.as_str());
            out.contextual.push(ContextualParagraph {
                text: p.text.clone(),
                matched_terms: shared,
            });
        }
    }
    out
}

fn is_citing(p: &Paragraph, key: &ArtifactKey<'_>, textual: bool) -> bool {
    if p.references.iter().any(|r| key.anchors.contains(r)) {
        return true;
    }
    if !textual {
        return false;
    }
    mentions_number(&p.text, key.kind, key.number)
        || key.file_name.is_some_and(|f| p.text.contains(f))
}

/// `true` if `text` mentions "Figure N" (images) or "Table N" (tables).
pub fn mentions_number(text: &str, kind: CandidateKind, number: u32) -> bool {
    let re = match kind {
        CandidateKind::Image => &*RE_FIGURE_MENTION,
        CandidateKind::Table => &*RE_TABLE_MENTION,
    };
    re.captures_iter(text)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .any(|n| n == number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::pipeline::boilerplate::{collect_paragraphs, BoilerplateFilter};
    use crate::pipeline::classify::Dialect;
    use crate::pipeline::parse::parse;
    use crate::pipeline::text::default_stop_words;

    fn paragraphs(markup: &str, dialect: Dialect) -> ParagraphSet {
        let filter = BoilerplateFilter::new(&ExtractionConfig::default()).unwrap();
        let doc = parse(markup, dialect, &filter).unwrap();
        collect_paragraphs(&doc.dom, doc.article_root, &filter, &default_stop_words())
    }

    fn terms(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn textual_figure_mention() {
        let set = paragraphs(
            "<p>As shown in Figure 1, outcomes improved.</p><p>Fig. 2 differs.</p><p>Figure 10 too.</p>",
            Dialect::WebPage,
        );
        let t = BTreeSet::new();
        let key = ArtifactKey {
            kind: CandidateKind::Image,
            number: 1,
            anchors: &[],
            file_name: None,
            terms: &t,
            region: None,
            caption: "",
        };
        let a = associate(&set, &key, 2);
        assert_eq!(a.citing, vec!["As shown in Figure 1, outcomes improved.".to_string()]);
    }

    #[test]
    fn structural_reference_wins_over_text() {
        let xml = r#"<article><body>
            <p>Summarised in <xref rid="T1">Table 1</xref>.</p>
            <p>Table 1 is mentioned without a link.</p>
        </body></article>"#;
        let set = paragraphs(xml, Dialect::StructuredXml);
        let anchors = vec!["T1".to_string()];
        let t = BTreeSet::new();
        let key = ArtifactKey {
            kind: CandidateKind::Table,
            number: 1,
            anchors: &anchors,
            file_name: None,
            terms: &t,
            region: None,
            caption: "",
        };
        let a = associate(&set, &key, 2);
        assert_eq!(a.citing, vec!["Summarised in Table 1.".to_string()]);
    }

    #[test]
    fn unrelated_links_keep_textual_citation() {
        let html = r##"<figure id="F1"><img src="f1.png"></figure>
            <p>As shown in Figure 1, outcomes improved [<a href="#B1">1</a>].</p>
            <p>Other work [<a href="#B2">2</a>].</p>"##;
        let set = paragraphs(html, Dialect::WebPage);
        let anchors = vec!["F1".to_string()];
        let t = BTreeSet::new();
        let key = ArtifactKey {
            kind: CandidateKind::Image,
            number: 1,
            anchors: &anchors,
            file_name: None,
            terms: &t,
            region: None,
            caption: "",
        };
        let a = associate(&set, &key, 2);
        assert_eq!(a.citing, vec!["As shown in Figure 1, outcomes improved [1].".to_string()]);
    }

    #[test]
    fn own_region_and_caption_are_excluded() {
        let html = r#"<figure id="F1"><img src="f1.png"><figcaption><p>Soil moisture by depth.</p></figcaption></figure>
            <div class="caption"><p>Table 1. Rainfall by site.</p></div><table><tr><td>x</td></tr></table>
            <p>Soil moisture fell with depth at every site.</p>"#;
        let filter = BoilerplateFilter::new(&ExtractionConfig::default()).unwrap();
        let doc = parse(html, Dialect::WebPage, &filter).unwrap();
        let set = collect_paragraphs(&doc.dom, doc.article_root, &filter, &default_stop_words());
        let figure = doc.dom.find_first(doc.dom.root(), &["figure"]);

        let t = terms(&["soil", "moisture", "depth"]);
        let key = ArtifactKey {
            kind: CandidateKind::Image,
            number: 1,
            anchors: &[],
            file_name: None,
            terms: &t,
            region: figure,
            caption: "Soil moisture by depth.",
        };
        let a = associate(&set, &key, 2);
        let texts: Vec<_> = a.contextual.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Soil moisture fell with depth at every site."]);

        let t = terms(&["rainfall", "site"]);
        let key = ArtifactKey {
            kind: CandidateKind::Table,
            number: 1,
            anchors: &[],
            file_name: None,
            terms: &t,
            region: doc.dom.find_first(doc.dom.root(), &["table"]),
            caption: "Rainfall by site.",
        };
        let a = associate(&set, &key, 2);
        assert!(a.citing.is_empty());
        assert!(a.contextual.is_empty());
    }

    #[test]
    fn file_name_counts_as_citation() {
        let set = paragraphs("<p>The raw scan is in f3.png for reference.</p>", Dialect::WebPage);
        let t = BTreeSet::new();
        let key = ArtifactKey {
            kind: CandidateKind::Image,
            number: 9,
            anchors: &[],
            file_name: Some("f3.png"),
            terms: &t,
            region: None,
            caption: "",
        };
        assert_eq!(associate(&set, &key, 2).citing.len(), 1);
    }

    #[test]
    fn contextual_respects_threshold_and_disjointness() {
        let set = paragraphs(
            "<p>Baseline characteristics of the cohort differed.</p>\
             <p>Baseline values only.</p>\
             <p>Table 1 lists baseline characteristics.</p>\
             <p>Baseline characteristics of the cohort differed.</p>",
            Dialect::WebPage,
        );
        let t = terms(&["baseline", "characteristics"]);
        let key = ArtifactKey {
            kind: CandidateKind::Table,
            number: 1,
            anchors: &[],
            file_name: None,
            terms: &t,
            region: None,
            caption: "",
        };
        let a = associate(&set, &key, 2);
        assert_eq!(a.citing, vec!["Table 1 lists baseline characteristics.".to_string()]);
        assert_eq!(a.contextual.len(), 1);
        assert_eq!(a.contextual[0].text, "Baseline characteristics of the cohort differed.");
        assert_eq!(a.contextual[0].matched_terms, t);
        for c in &a.contextual {
            assert!(!a.citing.contains(&c.text));
            assert!(c.matched_terms.len() >= 2);
        }
    }

    #[test]
    fn citing_deduplicated_in_order() {
        let set = paragraphs(
            "<p>See Figure 1.</p><p>Figure 1 again.</p><p>See Figure 1.</p>",
            Dialect::WebPage,
        );
        let t = BTreeSet::new();
        let key = ArtifactKey {
            kind: CandidateKind::Image,
            number: 1,
            anchors: &[],
            file_name: None,
            terms: &t,
            region: None,
            caption: "",
        };
        let a = associate(&set, &key, 2);
        assert_eq!(a.citing, vec!["See Figure 1.".to_string(), "Figure 1 again.".to_string()]);
    }

    #[test]
    fn mention_numbers_are_exact() {
        assert!(mentions_number("figs. 3", CandidateKind::Image, 3));
        assert!(mentions_number("TABLES 2 and 4", CandidateKind::Table, 2));
        assert!(!mentions_number("Figure 12", CandidateKind::Image, 1));
        assert!(!mentions_number("Table 1", CandidateKind::Image, 1));
        assert!(!mentions_number("timetable 1", CandidateKind::Table, 1));
    }

    #[test]
    fn informative_terms_union() {
        let sw = default_stop_words();
        let t = informative_terms(&["Baseline characteristics", "Age | Weight"], &sw);
        assert_eq!(t, terms(&["age", "baseline", "characteristics", "weight"]));
    }
}
