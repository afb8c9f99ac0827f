//! Configuration types for artifact extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Stop words, thresholds and selector
//! lists live here as one immutable value handed to every pipeline stage, so
//! two runs with equal configs over equal bytes produce equal records.

use crate::error::ExtractError;
use crate::pipeline::text::default_stop_words;
use crate::progress::ProgressCallback;
use crate::store::AssetStore;
use scraper::Selector;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Site-chrome regions removed from web pages before anything is collected.
pub const DEFAULT_EXCLUDED_SELECTORS: &[&str] = &[
    "header",
    "footer",
    "nav",
    ".usa-modal",
    ".usa-banner",
    ".usa-nav",
    "[role='banner']",
    "[role='navigation']",
    "[role='contentinfo']",
    "#ncbi-header",
    "#ncbi-footer",
    ".ncbi-header",
    ".ncbi-footer",
    ".pmc-sidebar",
    ".article-details",
    ".article-actions",
];

/// Article-root candidates, most specific first.
pub const DEFAULT_CONTENT_ROOT_SELECTORS: &[&str] = &[
    "main",
    "[role='main']",
    "article",
    ".article",
    "#mc",
    "#main-content",
];

/// Substrings that mark a paragraph as repository chrome rather than prose.
pub const DEFAULT_DISCLAIMER_PATTERNS: &[&str] = &[
    "PERMALINK",
    "As a library, NLM provides access to scientific literature",
    "Inclusion in an NLM database does not imply endorsement",
    "Copy As a library",
    "Open in a new tab",
    "Google Scholar",
    "Go to:",
];

/// Configuration for an extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use figctx::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .min_context_terms(3)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.min_context_terms, 3);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Words never counted as informative terms. Lowercase, alphabetic.
    pub stop_words: HashSet<String>,

    /// Shared informative terms a paragraph needs to count as contextual. Default: 2.
    pub min_context_terms: usize,

    /// Bytes inspected by the document classifier. Default: 400.
    pub classify_prefix_len: usize,

    /// Siblings searched on each side of a container-less image for a caption. Default: 3.
    pub caption_sibling_window: usize,

    /// CSS selectors of regions removed from web pages.
    pub excluded_selectors: Vec<String>,

    /// CSS selectors tried in order to locate the article root of a web page.
    pub content_root_selectors: Vec<String>,

    /// Paragraphs containing any of these substrings are discarded.
    pub disclaimer_patterns: Vec<String>,

    /// Delimiter between cells of a table row. Default: `" | "`.
    pub cell_separator: String,

    /// Keep the serialised table markup in each table record. Default: true.
    pub keep_table_markup: bool,

    /// Drop icon/logo/spinner images before numbering. Default: false.
    pub skip_decorative_images: bool,

    /// Documents processed concurrently by the batch driver. Default: 8.
    pub concurrency: usize,

    /// Asset store invoked for each image record. `None` disables persistence.
    pub asset_store: Option<Arc<dyn AssetStore>>,

    /// Optional per-document progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            stop_words: default_stop_words(),
            min_context_terms: 2,
            classify_prefix_len: 400,
            caption_sibling_window: 3,
            excluded_selectors: to_strings(DEFAULT_EXCLUDED_SELECTORS),
            content_root_selectors: to_strings(DEFAULT_CONTENT_ROOT_SELECTORS),
            disclaimer_patterns: to_strings(DEFAULT_DISCLAIMER_PATTERNS),
            cell_separator: " | ".to_string(),
            keep_table_markup: true,
            skip_decorative_images: false,
            concurrency: 8,
            asset_store: None,
            progress_callback: None,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("stop_words", &self.stop_words.len())
            .field("min_context_terms", &self.min_context_terms)
            .field("classify_prefix_len", &self.classify_prefix_len)
            .field("caption_sibling_window", &self.caption_sibling_window)
            .field("excluded_selectors", &self.excluded_selectors)
            .field("content_root_selectors", &self.content_root_selectors)
            .field("disclaimer_patterns", &self.disclaimer_patterns.len())
            .field("cell_separator", &self.cell_separator)
            .field("keep_table_markup", &self.keep_table_markup)
            .field("skip_decorative_images", &self.skip_decorative_images)
            .field("concurrency", &self.concurrency)
            .field("asset_store", &self.asset_store.as_ref().map(|_| "<dyn AssetStore>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check every constraint the builder enforces.
    ///
    /// Entry points call this too, since fields are public and a config may
    /// have been edited after `build()`.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.min_context_terms == 0 {
            return Err(ExtractError::InvalidConfig(
                "min_context_terms must be ≥ 1".into(),
            ));
        }
        if self.stop_words.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "stop-word set must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .stop_words
            .iter()
            .find(|w| w.is_empty() || !w.chars().all(|c| c.is_alphabetic() && !c.is_uppercase()))
        {
            return Err(ExtractError::InvalidConfig(format!(
                "stop word {bad:?} must be non-empty, lowercase and alphabetic"
            )));
        }
        if self.classify_prefix_len < 16 {
            return Err(ExtractError::InvalidConfig(format!(
                "classify_prefix_len must be ≥ 16, got {}",
                self.classify_prefix_len
            )));
        }
        if self.cell_separator.is_empty() || self.cell_separator.contains('\n') {
            return Err(ExtractError::InvalidConfig(
                "cell_separator must be non-empty and single-line".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ExtractError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        for sel in self
            .excluded_selectors
            .iter()
            .chain(self.content_root_selectors.iter())
        {
            parse_selector(sel)?;
        }
        Ok(())
    }
}

/// Compile one CSS selector, mapping failures to [`ExtractError::InvalidConfig`].
pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector)
        .map_err(|e| ExtractError::InvalidConfig(format!("bad selector {selector:?}: {e}")))
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    /// Replace the stop-word set. Words are lowercased.
    pub fn stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.stop_words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    /// Add words to the current stop-word set. Blank entries are skipped.
    pub fn extra_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.stop_words.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
        self
    }

    pub fn min_context_terms(mut self, n: usize) -> Self {
        self.config.min_context_terms = n;
        self
    }

    pub fn classify_prefix_len(mut self, n: usize) -> Self {
        self.config.classify_prefix_len = n;
        self
    }

    pub fn caption_sibling_window(mut self, n: usize) -> Self {
        self.config.caption_sibling_window = n;
        self
    }

    pub fn excluded_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.excluded_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn content_root_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.content_root_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn disclaimer_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.disclaimer_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn cell_separator(mut self, sep: impl Into<String>) -> Self {
        self.config.cell_separator = sep.into();
        self
    }

    pub fn keep_table_markup(mut self, v: bool) -> Self {
        self.config.keep_table_markup = v;
        self
    }

    pub fn skip_decorative_images(mut self, v: bool) -> Self {
        self.config.skip_decorative_images = v;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn asset_store(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.config.asset_store = Some(store);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
