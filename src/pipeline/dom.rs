//! Owned document tree shared by both dialects.
//!
//! HTML (via `scraper`) and XML (via `quick-xml`) are both lowered into this
//! arena so that locating, resolving and context association are written
//! once. Nodes are stored in pre-order: the descendants of a node occupy the
//! contiguous index range `id + 1 .. end`, which makes subtree scans and
//! "following in document order" queries plain range iterations.

use crate::pipeline::text::normalize;

/// Index of a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in document order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Resolved namespace URI, when the parser knows it.
    pub namespace: Option<String>,
    /// Local part of the name (`href` for `xlink:href`).
    pub local: String,
    /// Name exactly as written (`xlink:href`).
    pub qualified: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    /// Element with lowercase local name.
    Element { name: String, attrs: Vec<Attribute> },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    end: usize,
    kind: NodeKind,
}

/// Elements whose boundaries do not separate words.
const INLINE: &[&str] = &[
    "a", "abbr", "b", "bold", "code", "em", "ext-link", "font", "i", "italic", "mark",
    "monospace", "named-content", "sc", "small", "span", "strong", "styled-content", "sub",
    "sup", "u", "underline", "xref",
];

/// Elements serialised without a closing tag when empty.
const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

/// Pre-order arena of document nodes.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, including the document node.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Lowercase element name, `None` for text and document nodes.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// `true` if `id` is an element whose name is one of `names`.
    pub fn is(&self, id: NodeId, names: &[&str]) -> bool {
        self.name(id).is_some_and(|n| names.contains(&n))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Attribute by name as written in the source (`src`, `xlink:href`).
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.qualified == name)
            .map(|a| a.value.as_str())
    }

    /// Attribute by namespace URI and local name.
    pub fn attr_ns(&self, id: NodeId, namespace: &str, local: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.local == local && a.namespace.as_deref() == Some(namespace))
            .map(|a| a.value.as_str())
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    /// Non-empty `id` attribute.
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "id").map(str::trim).filter(|v| !v.is_empty())
    }

    /// `true` if the `class` attribute contains `fragment` (ASCII case-insensitive).
    pub fn class_contains(&self, id: NodeId, fragment: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.to_ascii_lowercase().contains(fragment))
    }

    // ── Navigation ───────────────────────────────────────────────────────

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0].children.iter().copied()
    }

    /// Element children only.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).filter(|c| self.name(*c).is_some())
    }

    /// All descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        (id.0 + 1..self.nodes[id.0].end).map(NodeId)
    }

    /// Descendant elements named one of `names`, in document order.
    pub fn find_all<'a>(
        &'a self,
        id: NodeId,
        names: &'a [&'a str],
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(id).filter(move |d| self.is(*d, names))
    }

    /// First descendant element named one of `names`.
    pub fn find_first(&self, id: NodeId, names: &[&str]) -> Option<NodeId> {
        self.descendants(id).find(|d| self.is(*d, names))
    }

    /// First element child named one of `names`.
    pub fn child_named(&self, id: NodeId, names: &[&str]) -> Option<NodeId> {
        self.children(id).find(|c| self.is(*c, names))
    }

    /// Ancestors from the parent up to the document node.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }

    /// Nearest ancestor element named one of `names`.
    pub fn closest_ancestor(&self, id: NodeId, names: &[&str]) -> Option<NodeId> {
        self.ancestors(id).find(|a| self.is(*a, names))
    }

    /// `true` if `ancestor` contains `id` (or is `id`).
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor.0 <= id.0 && id.0 < self.nodes[ancestor.0].end
    }

    /// Element siblings before `id`, nearest first.
    pub fn preceding_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        self.element_children(parent)
            .take_while(|s| *s != id)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    /// Element siblings after `id`, nearest first.
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        self.element_children(parent)
            .skip_while(|s| *s != id)
            .skip(1)
            .collect()
    }

    /// Nodes after the subtree of `id`, in document order.
    pub fn following(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        (self.nodes[id.0].end..self.nodes.len()).map(NodeId)
    }

    // ── Text and markup ──────────────────────────────────────────────────

    /// Normalised text content of `id` and its descendants.
    ///
    /// Block-level element boundaries separate words; inline ones do not.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        normalize(&out)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element { name, .. } => {
                let block = !INLINE.contains(&name.as_str());
                if block {
                    out.push(' ');
                }
                for child in self.children(id) {
                    self.collect_text(child, out);
                }
                if block {
                    out.push(' ');
                }
            }
            NodeKind::Document => {
                for child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Serialise the subtree rooted at `id` back to markup.
    pub fn serialize(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => out.push_str(&escape(t, false)),
            NodeKind::Document => {
                for child in self.children(id) {
                    self.write_markup(child, out);
                }
            }
            NodeKind::Element { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for a in attrs {
                    out.push(' ');
                    out.push_str(&a.qualified);
                    out.push_str("=\"");
                    out.push_str(&escape(&a.value, true));
                    out.push('"');
                }
                let children = &self.nodes[id.0].children;
                if children.is_empty() && VOID.contains(&name.as_str()) {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in children {
                    self.write_markup(*child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

fn escape(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ── Builder ──────────────────────────────────────────────────────────────

/// Incremental pre-order builder used by both parsers.
#[derive(Debug)]
pub struct DomBuilder {
    nodes: Vec<Node>,
    open: Vec<NodeId>,
}

impl Default for DomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DomBuilder {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                end: 1,
                kind: NodeKind::Document,
            }],
            open: vec![NodeId(0)],
        }
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(NodeId(0))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = self.current();
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            end: id.0 + 1,
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Open an element under the current node; it becomes the current node.
    pub fn start(&mut self, name: &str, attrs: Vec<Attribute>) -> NodeId {
        let id = self.push(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attrs,
        });
        self.open.push(id);
        id
    }

    /// Close the current element.
    pub fn end(&mut self) {
        if self.open.len() > 1 {
            if let Some(id) = self.open.pop() {
                self.nodes[id.0].end = self.nodes.len();
            }
        }
    }

    /// Append text under the current node, merging with a preceding text sibling.
    pub fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        if let Some(last) = self.nodes[parent.0].children.last().copied() {
            if let NodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                existing.push_str(text);
                return;
            }
        }
        self.push(NodeKind::Text(text.to_string()));
    }

    /// Number of elements still open.
    pub fn depth(&self) -> usize {
        self.open.len() - 1
    }

    /// Number of element nodes created so far.
    pub fn element_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Element { .. }))
            .count()
    }

    /// Close every open element and return the tree.
    pub fn finish(mut self) -> Dom {
        while self.open.len() > 1 {
            self.end();
        }
        self.nodes[0].end = self.nodes.len();
        Dom { nodes: self.nodes }
    }
}

impl Attribute {
    /// Attribute without namespace information.
    pub fn plain(name: &str, value: &str) -> Self {
        let local = name.rsplit(':').next().unwrap_or(name).to_string();
        Self {
            namespace: None,
            local,
            qualified: name.to_string(),
            value: value.to_string(),
        }
    }
}
