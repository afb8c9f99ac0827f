//! Caption, source and body resolution for located artifacts.
//!
//! Every field is resolved through a short ordered chain of lookups; the
//! first non-empty result wins and an exhausted chain yields an empty field.

use crate::pipeline::dom::{Dom, NodeId};
use crate::pipeline::locate::{ArtifactCandidate, CandidateKind};
use crate::pipeline::parse::XLINK_NS;
use crate::pipeline::text::{label_number, normalize, split_label};
use std::path::{Component, Path, PathBuf};

/// Sibling elements that may hold the caption of a container-less image.
const SIBLING_CAPTION_TAGS: &[&str] = &["p", "div", "span", "figcaption", "caption"];

/// Heading-like children used as a last-resort figure caption.
const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "title", "p"];

/// Resolved image fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub source_reference: String,
    pub resolved_source: String,
    pub alt_text: String,
    /// Caption with its leading label stripped.
    pub caption: String,
    /// Number from a `label` element or the caption label.
    pub number: Option<u32>,
    /// Ids of the node and its container.
    pub anchors: Vec<String>,
}

/// Resolved table fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTable {
    pub caption: String,
    pub body_text: String,
    pub structural_markup: Option<String>,
    pub number: Option<u32>,
    pub anchors: Vec<String>,
}

/// Resolve every image field for `candidate`.
pub fn resolve_image(
    dom: &Dom,
    candidate: &ArtifactCandidate,
    document_location: Option<&Path>,
    sibling_window: usize,
) -> ResolvedImage {
    let source_reference = resolve_source(dom, candidate.node);
    let resolved_source = resolve_absolute(document_location, &source_reference);
    let raw_caption = match candidate.container {
        Some(container) => container_caption(dom, container),
        None => sibling_caption(dom, candidate.node, sibling_window),
    };
    let (caption, number) = finish_caption(dom, &raw_caption, candidate.container);
    ResolvedImage {
        alt_text: alt_text(dom, candidate.node, candidate.container),
        source_reference,
        resolved_source,
        caption,
        number,
        anchors: anchors(dom, candidate),
    }
}

/// Resolve every table field for `candidate`.
pub fn resolve_table(
    dom: &Dom,
    candidate: &ArtifactCandidate,
    cell_separator: &str,
    keep_markup: bool,
) -> ResolvedTable {
    let raw_caption = table_caption(dom, candidate);
    let (caption, number) = finish_caption(dom, &raw_caption, candidate.container);
    ResolvedTable {
        caption,
        body_text: table_body(dom, candidate.node, cell_separator),
        structural_markup: keep_markup.then(|| dom.serialize(candidate.node)),
        number,
        anchors: anchors(dom, candidate),
    }
}

// ── Sources ──────────────────────────────────────────────────────────────

/// Raw asset reference of an image-like node.
///
/// `src`, then lazy-load `data-src`, then (JATS graphics only) `xlink:href`,
/// then a plain `href`. First non-empty value wins.
pub fn resolve_source(dom: &Dom, node: NodeId) -> String {
    let graphic = dom.is(node, &["graphic", "inline-graphic"]);
    let chain = [
        dom.attr(node, "src"),
        dom.attr(node, "data-src"),
        if graphic {
            dom.attr_ns(node, XLINK_NS, "href")
                .or_else(|| dom.attr(node, "xlink:href"))
        } else {
            None
        },
        dom.attr(node, "href"),
    ];
    chain
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// `true` for `data:` URIs.
pub fn is_inline_data(reference: &str) -> bool {
    reference
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("data:"))
}

/// `true` for `http://` and `https://` addresses.
pub fn is_network_address(reference: &str) -> bool {
    let lower = reference.get(..8).unwrap_or(reference).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Make a raw reference absolute.
///
/// Inline data and network addresses are returned unchanged. Anything else is
/// a filesystem path: joined with the directory of `document_location` (the
/// working directory when unknown) and normalised lexically. The file is not
/// required to exist.
pub fn resolve_absolute(document_location: Option<&Path>, raw: &str) -> String {
    if raw.is_empty() || is_inline_data(raw) || is_network_address(raw) {
        return raw.to_string();
    }
    let base = document_location
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."));
    let joined = base.join(raw);
    let absolute = std::path::absolute(&joined).unwrap_or(joined);
    normalize_path(&absolute).to_string_lossy().into_owned()
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Last path segment of a file or URL reference, without query or fragment.
pub fn asset_file_name(resolved_source: &str) -> Option<&str> {
    if resolved_source.is_empty() || is_inline_data(resolved_source) {
        return None;
    }
    let path = resolved_source
        .split(['?', '#'])
        .next()
        .unwrap_or(resolved_source);
    path.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

// ── Captions ─────────────────────────────────────────────────────────────

fn non_empty_text(dom: &Dom, node: Option<NodeId>) -> Option<String> {
    node.map(|n| dom.text(n)).filter(|t| !t.is_empty())
}

/// Figure caption inside a container: caption tag, caption-classed element,
/// then the first heading or paragraph.
fn container_caption(dom: &Dom, container: NodeId) -> String {
    non_empty_text(dom, dom.find_first(container, &["figcaption", "caption"]))
        .or_else(|| {
            let classed = dom
                .descendants(container)
                .find(|d| dom.name(*d).is_some() && dom.class_contains(*d, "caption"));
            non_empty_text(dom, classed)
        })
        .or_else(|| non_empty_text(dom, dom.find_first(container, HEADING_TAGS)))
        .unwrap_or_default()
}

/// Caption of a container-less image: nearest preceding, then following,
/// paragraph-like sibling with text.
fn sibling_caption(dom: &Dom, node: NodeId, window: usize) -> String {
    let before = dom.preceding_siblings(node).into_iter().take(window);
    let after = dom.following_siblings(node).into_iter().take(window);
    before
        .chain(after)
        .filter(|s| dom.is(*s, SIBLING_CAPTION_TAGS))
        .find_map(|s| non_empty_text(dom, Some(s)))
        .unwrap_or_default()
}

/// Table caption chain.
///
/// 1. `caption` child of the table.
/// 2. On the container (or parent): `figcaption`, a `caption`/`title` child,
///    then the first `p` child.
/// 3. A caption-classed element immediately preceding the parent or
///    grandparent.
/// 4. The first paragraph following the table in document order.
fn table_caption(dom: &Dom, candidate: &ArtifactCandidate) -> String {
    let table = candidate.node;
    let holder = candidate.container.or_else(|| dom.parent(table));

    non_empty_text(dom, dom.child_named(table, &["caption"]))
        .or_else(|| {
            let holder = holder?;
            non_empty_text(dom, dom.find_first(holder, &["figcaption"]))
                .or_else(|| non_empty_text(dom, dom.child_named(holder, &["caption", "title"])))
                .or_else(|| non_empty_text(dom, dom.child_named(holder, &["p"])))
        })
        .or_else(|| {
            let parent = dom.parent(table);
            let grandparent = parent.and_then(|p| dom.parent(p));
            [parent, grandparent]
                .into_iter()
                .flatten()
                .filter_map(|w| dom.preceding_siblings(w).into_iter().next())
                .filter(|s| dom.is(*s, &["caption"]) || dom.class_contains(*s, "caption"))
                .find_map(|s| non_empty_text(dom, Some(s)))
        })
        .or_else(|| {
            let next_p = dom.following(table).find(|n| dom.is(*n, &["p"]));
            non_empty_text(dom, next_p)
        })
        .unwrap_or_default()
}

/// Strip the leading label and settle the artifact number.
///
/// A JATS `label` child of the container outranks a number in the caption.
fn finish_caption(dom: &Dom, raw: &str, container: Option<NodeId>) -> (String, Option<u32>) {
    let (caption_number, rest) = split_label(raw);
    let label = container
        .and_then(|c| dom.child_named(c, &["label"]))
        .and_then(|l| label_number(&dom.text(l)));
    (normalize(rest), label.or(caption_number))
}

fn alt_text(dom: &Dom, node: NodeId, container: Option<NodeId>) -> String {
    if let Some(alt) = dom.attr(node, "alt").map(normalize).filter(|a| !a.is_empty()) {
        return alt;
    }
    non_empty_text(dom, dom.find_first(node, &["alt-text"]))
        .or_else(|| container.and_then(|c| non_empty_text(dom, dom.child_named(c, &["alt-text"]))))
        .unwrap_or_default()
}

/// Ids a cross-reference may target: the node, its container, and for a
/// bare table the nearest id-carrying wrapper within three levels.
fn anchors(dom: &Dom, candidate: &ArtifactCandidate) -> Vec<String> {
    let wrapper = match (candidate.kind, candidate.container) {
        (CandidateKind::Table, None) => dom
            .ancestors(candidate.node)
            .take(3)
            .find(|a| dom.element_id(*a).is_some()),
        _ => None,
    };
    let mut ids: Vec<String> = Vec::new();
    for n in [Some(candidate.node), candidate.container, wrapper].into_iter().flatten() {
        if let Some(id) = dom.element_id(n) {
            if !ids.iter().any(|i| i == id) {
                ids.push(id.to_string());
            }
        }
    }
    ids
}

// ── Table body ───────────────────────────────────────────────────────────

/// Row-major cell text, rows joined by `\n`, cells by `separator`.
///
/// Rows of nested tables are left to their own table. Without any row the
/// flattened table text is returned.
pub fn table_body(dom: &Dom, table: NodeId, separator: &str) -> String {
    let rows: Vec<String> = dom
        .find_all(table, &["tr"])
        .filter(|tr| dom.closest_ancestor(*tr, &["table"]) == Some(table))
        .filter_map(|tr| {
            let cells: Vec<String> = dom
                .element_children(tr)
                .filter(|c| dom.is(*c, &["td", "th"]))
                .map(|c| dom.text(c))
                .collect();
            (!cells.is_empty()).then(|| cells.join(separator))
        })
        .collect();
    if rows.is_empty() {
        dom.text(table)
    } else {
        rows.join("\n")
    }
}
