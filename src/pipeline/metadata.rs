//! Article metadata: title, authors, abstract and publication date.
//!
//! Web pages expose Highwire-style `citation_*` meta tags; JATS articles
//! carry `article-meta` front matter. Both resolve through short fallback
//! chains, and every field may end up absent.

use crate::output::ArticleMetadata;
use crate::pipeline::classify::Dialect;
use crate::pipeline::dom::{Dom, NodeId};
use crate::pipeline::text::normalize;

/// Abstracts shorter than this are treated as missing.
pub const MIN_ABSTRACT_LEN: usize = 20;

/// Extract metadata from a parsed document.
pub fn extract_metadata(dom: &Dom, dialect: Dialect) -> ArticleMetadata {
    let mut meta = match dialect {
        Dialect::WebPage => web_page_metadata(dom),
        Dialect::StructuredXml => xml_metadata(dom),
    };
    meta.abstract_text = meta
        .abstract_text
        .filter(|a| a.chars().count() >= MIN_ABSTRACT_LEN);
    meta
}

// ── Web page ─────────────────────────────────────────────────────────────

fn meta_content<'a>(dom: &'a Dom, key: &str) -> impl Iterator<Item = String> + 'a {
    let key = key.to_string();
    dom.find_all(dom.root(), &["meta"])
        .filter(move |m| {
            dom.attr(*m, "name") == Some(key.as_str()) || dom.attr(*m, "property") == Some(key.as_str())
        })
        .filter_map(move |m| dom.attr(m, "content").map(normalize))
        .filter(|c| !c.is_empty())
}

fn web_page_metadata(dom: &Dom) -> ArticleMetadata {
    let root = dom.root();
    let title = meta_content(dom, "citation_title")
        .next()
        .or_else(|| non_empty(dom, dom.find_first(root, &["title"])))
        .or_else(|| {
            let h1 = dom
                .find_all(root, &["h1"])
                .find(|h| dom.class_contains(*h, "content-title"));
            non_empty(dom, h1)
        });

    let authors = meta_content(dom, "citation_author").collect();

    let abstract_text = meta_content(dom, "description")
        .next()
        .or_else(|| meta_content(dom, "og:description").next())
        .or_else(|| {
            let div = dom.find_all(root, &["div"]).find(|d| {
                dom.class_contains(*d, "abstract-content") || dom.element_id(*d) == Some("abstract-1")
            });
            non_empty(dom, div)
        });

    let publication_date = meta_content(dom, "citation_publication_date")
        .next()
        .and_then(|d| normalize_date(&d));

    ArticleMetadata {
        title,
        authors,
        abstract_text,
        publication_date,
    }
}

// ── JATS ─────────────────────────────────────────────────────────────────

fn xml_metadata(dom: &Dom) -> ArticleMetadata {
    let root = dom.root();
    let title = non_empty(dom, dom.find_first(root, &["article-title"]));

    let authors = dom
        .find_all(root, &["contrib"])
        .filter(|c| dom.attr(*c, "contrib-type") == Some("author"))
        .filter_map(|c| dom.find_first(c, &["name"]))
        .map(|n| {
            let given = non_empty(dom, dom.find_first(n, &["given-names"])).unwrap_or_default();
            let surname = non_empty(dom, dom.find_first(n, &["surname"])).unwrap_or_default();
            normalize(&format!("{given} {surname}"))
        })
        .filter(|a| !a.is_empty())
        .collect();

    let abstract_text = dom.find_first(root, &["abstract"]).and_then(|a| {
        let paras: Vec<String> = dom
            .find_all(a, &["p"])
            .map(|p| dom.text(p))
            .filter(|t| !t.is_empty())
            .collect();
        if paras.is_empty() {
            non_empty(dom, Some(a))
        } else {
            Some(paras.join(" "))
        }
    });

    ArticleMetadata {
        title,
        authors,
        abstract_text,
        publication_date: xml_publication_date(dom, root),
    }
}

fn xml_publication_date(dom: &Dom, root: NodeId) -> Option<String> {
    let dates: Vec<NodeId> = dom.find_all(root, &["pub-date"]).collect();
    let typed = |kind: &str| {
        dates.iter().copied().find(|d| {
            dom.attr(*d, "pub-type") == Some(kind) || dom.attr(*d, "date-type") == Some(kind)
        })
    };
    let pub_date = typed("epub")
        .or_else(|| typed("ppub"))
        .or_else(|| dates.first().copied())?;

    if let Some(s) = non_empty(dom, dom.find_first(pub_date, &["string-date"])) {
        return normalize_date(&s);
    }
    let part = |name: &str| non_empty(dom, dom.find_first(pub_date, &[name])).unwrap_or_default();
    let joined = [part("year"), part("month"), part("day")]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_date(&joined)
}

fn non_empty(dom: &Dom, node: Option<NodeId>) -> Option<String> {
    node.map(|n| dom.text(n)).filter(|t| !t.is_empty())
}

// ── Dates ────────────────────────────────────────────────────────────────

const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

/// Month number from "3", "03", "Mar", "Mar." or "March".
fn month_number(token: &str) -> Option<u32> {
    if let Ok(n) = token.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let lower = token.trim_end_matches('.').to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| {
            *m == lower || m.get(..3) == Some(lower.as_str()) || (lower == "sept" && *m == "september")
        })
        .map(|i| i as u32 + 1)
}

/// Normalise a date to `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
///
/// Accepts "2021 Mar 15", "2021-03-15", "2021/3/5", "2021 March" and a bare
/// year. A missing or unreadable year gives `None`; an unreadable month or
/// day truncates the result at the year or month.
pub fn normalize_date(raw: &str) -> Option<String> {
    let mut parts = raw
        .split(|c: char| c.is_whitespace() || c == '-' || c == '/' || c == ',')
        .filter(|p| !p.is_empty());

    let year = parts.next()?;
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let Some(month) = parts.next().and_then(month_number) else {
        return Some(year.to_string());
    };
    let day = parts
        .next()
        .and_then(|d| d.parse::<u32>().ok())
        .filter(|d| (1..=31).contains(d));
    Some(match day {
        Some(d) => format!("{year}-{month:02}-{d:02}"),
        None => format!("{year}-{month:02}"),
    })
}
