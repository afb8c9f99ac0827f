//! # figctx
//!
//! Extract figures and tables from scientific articles, together with their
//! captions, asset sources, and the paragraphs that cite or discuss them.
//!
//! Two document dialects are handled by one engine: publisher / repository
//! HTML pages and JATS full-text XML. Each artifact becomes an
//! [`ArtifactRecord`]; each document becomes one ordered collection of them.
//!
//! ## Pipeline Overview
//!
//! ```text
//! bytes
//!  │
//!  ├─ 1. Classify     web page or structured XML (prefix sniff)
//!  ├─ 2. Parse        scraper / quick-xml, with fallback to the other
//!  ├─ 3. Boilerplate  drop site chrome, find the article root, collect paragraphs
//!  ├─ 4. Locate       figure containers, standalone images, tables
//!  ├─ 5. Resolve      caption, source, alt text, table body (ordered fallbacks)
//!  ├─ 6. Associate    citing paragraphs (cross-refs, "Figure N") + term overlap
//!  └─ 7. Assemble     stable ids, optional asset persistence
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use figctx::{extract_dir, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let batch = extract_dir("corpus/", &config).await?;
//!     for doc in &batch.documents {
//!         for record in &doc.artifacts {
//!             println!("{} [{}] {}", record.artifact_id, record.citing_paragraphs.len(), record.caption);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `figctx` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! figctx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod store;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{DocumentError, ExtractError, PersistError};
pub use extract::{
    extract, extract_batch, extract_dir, extract_sync, extract_to_dir, write_document, Extractor,
};
pub use output::{
    ArticleMetadata, ArtifactDetail, ArtifactKind, ArtifactRecord, BatchOutput, BatchStats,
    BatchSummary, ContextualParagraph, DocumentOutput, ImageDetail, TableDetail,
};
pub use pipeline::classify::Dialect;
pub use pipeline::input::{discover_documents, DocumentFile, SourceDocument};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use store::{AssetStore, FsAssetStore};
pub use stream::{extract_dir_stream, extract_stream, DocumentStream};
