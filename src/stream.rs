//! Streaming extraction API: emit documents as they complete.
//!
//! Unlike the eager [`crate::extract::extract_batch`], which returns only
//! after every document finishes, [`extract_stream`] yields each
//! [`DocumentOutput`] as soon as it is ready. Documents arrive in completion
//! order; sort by `document_id` if order matters.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extract::{BatchInput, Extractor};
use crate::output::DocumentOutput;
use crate::pipeline::input::{self, SourceDocument};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentOutput> + Send>>;

/// Extract in-memory documents, streaming results as they are ready.
///
/// # Errors
/// Only an invalid configuration is fatal; per-document failures arrive as
/// items whose `error` is set.
///
/// # Example
/// ```rust,no_run
/// use figctx::{extract_stream, ExtractionConfig, SourceDocument};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let docs = vec![SourceDocument::from_bytes("a", "<figure><img src=\"a.png\"></figure>")];
/// let mut stream = extract_stream(docs, &ExtractionConfig::default())?;
/// while let Some(doc) = stream.next().await {
///     println!("{}: {} artifact(s)", doc.document_id, doc.artifacts.len());
/// }
/// # Ok(())
/// # }
/// ```
pub fn extract_stream(
    documents: Vec<SourceDocument>,
    config: &ExtractionConfig,
) -> Result<DocumentStream, ExtractError> {
    let extractor = Extractor::new(config.clone())?;
    info!("Starting streaming extraction: {} document(s)", documents.len());
    let items = documents.into_iter().map(BatchInput::Loaded).collect();
    Ok(into_stream(extractor, items))
}

/// Discover documents under `dir` and stream their results.
pub async fn extract_dir_stream(
    dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<DocumentStream, ExtractError> {
    let extractor = Extractor::new(config.clone())?;
    let files = input::discover_documents(dir.as_ref()).await?;
    info!("Starting streaming extraction: {} file(s)", files.len());
    let items = files.into_iter().map(BatchInput::File).collect();
    Ok(into_stream(extractor, items))
}

fn into_stream(extractor: Extractor, items: Vec<BatchInput>) -> DocumentStream {
    let concurrency = extractor.config().concurrency;
    let s = stream::iter(items.into_iter().map(move |item| {
        let extractor = extractor.clone();
        async move { extractor.process(item).await }
    }))
    .buffer_unordered(concurrency);
    Box::pin(s)
}
