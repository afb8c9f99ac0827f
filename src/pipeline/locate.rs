//! Artifact location: image and table candidates in document order.
//!
//! Image discovery runs two passes. The container pass takes the first
//! image-like node of every figure container; the standalone pass takes every
//! remaining image-like node that has no figure ancestor. A node claimed by
//! the container pass is never emitted again.

use crate::pipeline::dom::{Dom, NodeId};
use std::collections::HashSet;

/// Figure containers across both dialects.
pub const FIGURE_CONTAINERS: &[&str] = &["figure", "fig"];

/// Image-like nodes: HTML `img`, JATS `graphic` / `inline-graphic`.
pub const IMAGE_NODES: &[&str] = &["img", "graphic", "inline-graphic"];

/// Wrappers that give a table its caption and anchor id.
pub const TABLE_CONTAINERS: &[&str] = &["table-wrap", "figure", "fig"];

/// Generic wrappers searched when no table is found under the article root.
const TABLE_FALLBACK_WRAPPERS: &[&str] = &["div", "section", "figure", "fig", "table-wrap"];

/// Source-reference fragments that mark an image as decoration.
const DECORATIVE_MARKERS: &[&str] = &["icon", "logo", "flag", "spinner", "loader"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Image,
    Table,
}

/// A located artifact node and its enclosing container, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactCandidate {
    pub kind: CandidateKind,
    pub node: NodeId,
    pub container: Option<NodeId>,
}

/// Image candidates under `root`: container pass first, then standalone pass.
///
/// Extraction passes the document node, not the article root.
pub fn locate_images(dom: &Dom, root: NodeId) -> Vec<ArtifactCandidate> {
    let mut claimed: HashSet<NodeId> = HashSet::new();
    let mut out = Vec::new();

    for container in dom.find_all(root, FIGURE_CONTAINERS) {
        let first = dom
            .find_first(container, &["img"])
            .or_else(|| dom.find_first(container, &["graphic", "inline-graphic"]));
        if let Some(node) = first {
            if claimed.insert(node) {
                out.push(ArtifactCandidate {
                    kind: CandidateKind::Image,
                    node,
                    container: Some(container),
                });
            }
        }
    }

    for node in dom.find_all(root, IMAGE_NODES) {
        if claimed.contains(&node) || dom.closest_ancestor(node, FIGURE_CONTAINERS).is_some() {
            continue;
        }
        out.push(ArtifactCandidate {
            kind: CandidateKind::Image,
            node,
            container: None,
        });
    }

    out
}

/// Table candidates.
///
/// Native `table` elements under `root` (outermost only). When there are
/// none, the search widens to the whole document and reports each table
/// through the nearest generic wrapper that contains it.
pub fn locate_tables(dom: &Dom, root: NodeId) -> Vec<ArtifactCandidate> {
    let primary: Vec<ArtifactCandidate> = dom
        .find_all(root, &["table"])
        .filter(|t| dom.closest_ancestor(*t, &["table"]).is_none())
        .map(|node| ArtifactCandidate {
            kind: CandidateKind::Table,
            node,
            container: dom.closest_ancestor(node, TABLE_CONTAINERS),
        })
        .collect();
    if !primary.is_empty() {
        return primary;
    }

    dom.find_all(dom.root(), &["table"])
        .filter(|t| dom.closest_ancestor(*t, &["table"]).is_none())
        .filter_map(|node| {
            let wrapper = dom.closest_ancestor(node, TABLE_FALLBACK_WRAPPERS)?;
            Some(ArtifactCandidate {
                kind: CandidateKind::Table,
                node,
                container: Some(wrapper),
            })
        })
        .collect()
}

/// `true` for icon/logo/flag/spinner/loader references and SVG files.
pub fn is_decorative(source_reference: &str) -> bool {
    let lower = source_reference.to_ascii_lowercase();
    DECORATIVE_MARKERS.iter().any(|m| lower.contains(m)) || lower.ends_with(".svg")
}
