//! Document classification: web page or structured article XML.
//!
//! Only a fixed-size prefix of the raw bytes is inspected. The resulting
//! [`Dialect`] picks the primary parse strategy and tells the boilerplate
//! filter and metadata resolver which conventions to expect.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Markup convention of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// General HTML web page (for example a PMC article page).
    WebPage,
    /// JATS / NLM article XML.
    StructuredXml,
}

impl Dialect {
    /// The other dialect, used for the fallback parse.
    pub fn alternate(self) -> Self {
        match self {
            Dialect::WebPage => Dialect::StructuredXml,
            Dialect::StructuredXml => Dialect::WebPage,
        }
    }
}

/// Root element names that mark article XML.
const ARTICLE_ROOTS: &[&str] = &["article", "pmc-articleset"];

// First element start tag, skipping `<?…?>`, `<!…>` and comments.
static RE_FIRST_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z][A-Za-z0-9:._-]*)").unwrap());

/// Classify raw document bytes by looking at the first `prefix_len` bytes.
///
/// An XML declaration or an `article`/`pmc-articleset` first element means
/// [`Dialect::StructuredXml`]; anything else is [`Dialect::WebPage`].
pub fn classify(raw: &[u8], prefix_len: usize) -> Dialect {
    let end = raw.len().min(prefix_len);
    let prefix = String::from_utf8_lossy(&raw[..end]);
    let prefix = prefix.trim_start_matches('\u{feff}').trim_start();

    if prefix.starts_with("<?xml") {
        return Dialect::StructuredXml;
    }

    let first = RE_FIRST_TAG
        .captures(prefix)
        .map(|caps| caps[1].to_ascii_lowercase());
    match first {
        Some(name) => {
            let local = name.rsplit(':').next().unwrap_or(&name);
            if ARTICLE_ROOTS.contains(&local) {
                Dialect::StructuredXml
            } else {
                Dialect::WebPage
            }
        }
        None => Dialect::WebPage,
    }
}
