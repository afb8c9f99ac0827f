//! Parse strategies: HTML via `scraper`, namespace-aware XML via `quick-xml`.
//!
//! The classifier picks the primary strategy; when it fails the alternate
//! one is tried before the document is given up as unparsable. Both
//! strategies lower their tree into the shared [`Dom`].

use crate::pipeline::boilerplate::BoilerplateFilter;
use crate::pipeline::classify::Dialect;
use crate::pipeline::dom::{Attribute, Dom, DomBuilder, NodeId};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use scraper::{ElementRef, Html, Selector};
use std::borrow::Cow;
use tracing::debug;

/// XLink namespace used by JATS `graphic` references.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Elements dropped while lowering HTML; they never carry article prose.
const SKIPPED_HTML: &[&str] = &["script", "style", "noscript", "template"];

/// A parsed document ready for artifact location.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub dom: Dom,
    /// Classification of the raw bytes.
    pub dialect: Dialect,
    /// Parser that actually produced `dom`.
    pub strategy: Dialect,
    /// Region holding the article prose.
    pub article_root: NodeId,
    /// `true` when site chrome was removed.
    pub boilerplate_filtered: bool,
}

/// Parse `text` with the strategy selected by `dialect`, falling back to the
/// alternate parser. `Err` carries both failure reasons.
pub fn parse(
    text: &str,
    dialect: Dialect,
    filter: &BoilerplateFilter,
) -> Result<ParsedDocument, String> {
    match parse_with(text, dialect, dialect, filter) {
        Ok(doc) => Ok(doc),
        Err(primary) => {
            let fallback = dialect.alternate();
            debug!("Primary {:?} parse failed ({}), trying {:?}", dialect, primary, fallback);
            parse_with(text, dialect, fallback, filter)
                .map_err(|second| format!("{primary}; fallback: {second}"))
        }
    }
}

fn parse_with(
    text: &str,
    dialect: Dialect,
    strategy: Dialect,
    filter: &BoilerplateFilter,
) -> Result<ParsedDocument, String> {
    match strategy {
        Dialect::WebPage => {
            let html = parse_html(text)?;
            let (dom, article_root, filtered) =
                if dialect == Dialect::WebPage && has_page_wrapper(text) {
                    let (dom, root) = filter.filter_html(&html);
                    (dom, root, true)
                } else {
                    let (dom, _) = lower_html(&html, &[], &[]);
                    let root = dom.root();
                    (dom, root, false)
                };
            Ok(ParsedDocument {
                dom,
                dialect,
                strategy,
                article_root,
                boilerplate_filtered: filtered,
            })
        }
        Dialect::StructuredXml => {
            let dom = lower_xml(text)?;
            let article_root = dom.root();
            Ok(ParsedDocument {
                dom,
                dialect,
                strategy,
                article_root,
                boilerplate_filtered: false,
            })
        }
    }
}

/// `true` when the raw text carries both an `<html` and a `<head` tag.
pub fn has_page_wrapper(text: &str) -> bool {
    contains_ignore_ascii_case(text, "<html") && contains_ignore_ascii_case(text, "<head")
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

// ── HTML ─────────────────────────────────────────────────────────────────

fn parse_html(text: &str) -> Result<Html, String> {
    // html5ever accepts anything; text without a single tag is not markup.
    if !text.contains('<') {
        return Err("no markup found".into());
    }
    Ok(Html::parse_document(text))
}

/// Lower an HTML tree into a [`Dom`].
///
/// Elements matching any `excluded` selector are dropped with their whole
/// subtree. For each selector in `probes` the first surviving matching
/// element is reported, in the same order as `probes`.
pub(crate) fn lower_html(
    html: &Html,
    excluded: &[Selector],
    probes: &[Selector],
) -> (Dom, Vec<Option<NodeId>>) {
    let mut lowering = HtmlLowering {
        builder: DomBuilder::new(),
        excluded,
        probes,
        hits: vec![None; probes.len()],
    };
    lowering.element(html.root_element());
    let HtmlLowering { builder, hits, .. } = lowering;
    (builder.finish(), hits)
}

struct HtmlLowering<'s> {
    builder: DomBuilder,
    excluded: &'s [Selector],
    probes: &'s [Selector],
    hits: Vec<Option<NodeId>>,
}

impl HtmlLowering<'_> {
    fn element(&mut self, el: ElementRef<'_>) {
        let name = el.value().name();
        if SKIPPED_HTML.contains(&name) || self.excluded.iter().any(|s| s.matches(&el)) {
            return;
        }
        let attrs = el
            .value()
            .attrs()
            .map(|(k, v)| Attribute::plain(k, v))
            .collect();
        let id = self.builder.start(name, attrs);
        for (hit, probe) in self.hits.iter_mut().zip(self.probes) {
            if hit.is_none() && probe.matches(&el) {
                *hit = Some(id);
            }
        }
        for child in el.children() {
            match child.value() {
                scraper::Node::Text(t) => self.builder.text(&t.text),
                scraper::Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.element(child_el);
                    }
                }
                _ => {}
            }
        }
        self.builder.end();
    }
}

// ── XML ──────────────────────────────────────────────────────────────────

/// Parse well-formed XML into a [`Dom`].
///
/// Element names keep only their local part; attributes keep their resolved
/// namespace so `xlink:href` is found whatever prefix the document binds.
pub(crate) fn lower_xml(text: &str) -> Result<Dom, String> {
    let mut reader = NsReader::from_str(text);
    let mut builder = DomBuilder::new();
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let attrs = xml_attrs(&reader, &e);
                builder.start(&xml_local_name(&e), attrs);
                seen_root = true;
            }
            Ok(Event::Empty(e)) => {
                let attrs = xml_attrs(&reader, &e);
                builder.start(&xml_local_name(&e), attrs);
                builder.end();
                seen_root = true;
            }
            Ok(Event::End(_)) => builder.end(),
            Ok(Event::Text(t)) => {
                if builder.depth() > 0 {
                    let s = t
                        .unescape()
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    builder.text(&s);
                }
            }
            Ok(Event::CData(c)) => {
                if builder.depth() > 0 {
                    builder.text(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "XML error near byte {}: {e}",
                    reader.buffer_position()
                ))
            }
        }
    }

    if !seen_root {
        return Err("no root element".into());
    }
    if builder.depth() > 0 {
        return Err(format!("{} unclosed element(s) at end of input", builder.depth()));
    }
    Ok(builder.finish())
}

fn xml_local_name(e: &BytesStart<'_>) -> String {
    let local = e.local_name();
    String::from_utf8_lossy(local.as_ref()).into_owned()
}

fn xml_attrs(reader: &NsReader<&[u8]>, e: &BytesStart<'_>) -> Vec<Attribute> {
    e.attributes()
        .with_checks(false)
        .flatten()
        .map(|a| {
            let (ns, local) = reader.resolve_attribute(a.key);
            let namespace = match ns {
                ResolveResult::Bound(Namespace(uri)) => {
                    Some(String::from_utf8_lossy(uri).into_owned())
                }
                _ => None,
            };
            let value = a
                .unescape_value()
                .map(Cow::into_owned)
                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned());
            Attribute {
                namespace,
                local: String::from_utf8_lossy(local.as_ref()).into_owned(),
                qualified: String::from_utf8_lossy(a.key.as_ref()).into_owned(),
                value,
            }
        })
        .collect()
}
