//! Eager extraction entry points.
//!
//! [`Extractor`] runs the pipeline for one document. The free functions wrap
//! it for the common cases: one document, a batch held in memory, a
//! directory of files, and directory-to-directory with one JSON file per
//! document. Use [`crate::stream::extract_stream`] to receive documents as
//! they finish instead of waiting for the whole batch.

use crate::config::ExtractionConfig;
use crate::error::{DocumentError, ExtractError};
use crate::output::{ArtifactDetail, BatchOutput, BatchStats, DocumentOutput};
use crate::pipeline::assemble::{assemble, DocumentView};
use crate::pipeline::boilerplate::{collect_paragraphs, BoilerplateFilter};
use crate::pipeline::classify::classify;
use crate::pipeline::input::{self, DocumentFile, SourceDocument};
use crate::pipeline::locate::{locate_images, locate_tables};
use crate::pipeline::metadata::extract_metadata;
use crate::pipeline::parse::parse;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The extraction engine: a validated configuration plus its compiled
/// selectors. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Extractor {
    config: Arc<ExtractionConfig>,
    filter: Arc<BoilerplateFilter>,
}

impl Extractor {
    /// Validate `config` and compile its selector lists.
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractError> {
        config.validate()?;
        let filter = BoilerplateFilter::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            filter: Arc::new(filter),
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run classify → parse → filter → locate → resolve → associate →
    /// assemble on one document. Pure and synchronous; assets are not
    /// persisted.
    pub fn extract_document(&self, doc: &SourceDocument) -> DocumentOutput {
        let config = &*self.config;
        let dialect = classify(&doc.content, config.classify_prefix_len);

        let text = match std::str::from_utf8(&doc.content) {
            Ok(t) => t.strip_prefix('\u{feff}').unwrap_or(t),
            Err(_) => {
                let err = DocumentError::Undecodable {
                    document_id: doc.id.clone(),
                };
                warn!("{}", err);
                return DocumentOutput::failed(err, Some(dialect));
            }
        };

        let parsed = match parse(text, dialect, &self.filter) {
            Ok(p) => p,
            Err(detail) => {
                let err = DocumentError::Unparsable {
                    document_id: doc.id.clone(),
                    detail,
                };
                warn!("{}", err);
                return DocumentOutput::failed(err, Some(dialect));
            }
        };
        debug!(
            "{}: {:?} parsed as {:?}, {} nodes, boilerplate filtered: {}",
            doc.id,
            dialect,
            parsed.strategy,
            parsed.dom.len(),
            parsed.boilerplate_filtered
        );

        let paragraphs =
            collect_paragraphs(&parsed.dom, parsed.article_root, &self.filter, &config.stop_words);
        // Chrome is already gone, so images are searched document-wide.
        let images = locate_images(&parsed.dom, parsed.dom.root());
        let tables = locate_tables(&parsed.dom, parsed.article_root);
        debug!(
            "{}: {} paragraph(s), {} image and {} table candidate(s)",
            doc.id,
            paragraphs.len(),
            images.len(),
            tables.len()
        );

        let view = DocumentView {
            document_id: &doc.id,
            dom: &parsed.dom,
            location: doc.location.as_deref(),
            paragraphs: &paragraphs,
        };
        let artifacts = assemble(&view, &images, &tables, config);

        DocumentOutput {
            document_id: doc.id.clone(),
            dialect: Some(dialect),
            metadata: extract_metadata(&parsed.dom, dialect),
            artifacts,
            error: None,
        }
    }

    /// Hand every image with a resolved source to the configured asset
    /// store and record where it landed. A store failure leaves
    /// `saved_location` empty.
    pub async fn persist_assets(&self, output: &mut DocumentOutput) {
        let Some(store) = self.config.asset_store.as_ref() else {
            return;
        };
        for record in &mut output.artifacts {
            let ArtifactDetail::Image(detail) = &mut record.detail else {
                continue;
            };
            if detail.resolved_source.is_empty() {
                continue;
            }
            if let Some(location) = store
                .save(&record.document_id, &record.artifact_id, &detail.resolved_source)
                .await
            {
                detail.saved_location = location;
            }
        }
    }

    /// Extract one document off the async runtime, then persist its assets.
    pub async fn extract(&self, doc: SourceDocument) -> DocumentOutput {
        let id = doc.id.clone();
        let this = self.clone();
        let mut output = match tokio::task::spawn_blocking(move || this.extract_document(&doc)).await
        {
            Ok(output) => output,
            Err(e) => {
                let err = DocumentError::Unparsable {
                    document_id: id,
                    detail: format!("extraction task failed: {e}"),
                };
                warn!("{}", err);
                return DocumentOutput::failed(err, None);
            }
        };
        if output.is_ok() {
            self.persist_assets(&mut output).await;
        }
        output
    }

    /// Load (if needed), extract and report one batch item.
    pub(crate) async fn process(&self, item: BatchInput) -> DocumentOutput {
        let cb = self.config.progress_callback.clone();
        if let Some(ref cb) = cb {
            cb.on_document_start(&item.document_id());
        }

        let output = match item.load().await {
            Ok(doc) => self.extract(doc).await,
            Err(err) => {
                warn!("{}", err);
                DocumentOutput::failed(err, None)
            }
        };

        if let Some(ref cb) = cb {
            match &output.error {
                None => cb.on_document_complete(&output.document_id, output.artifacts.len()),
                Some(e) => cb.on_document_error(&output.document_id, &e.to_string()),
            }
        }
        output
    }
}

/// One unit of batch work: bytes already in memory, or a file to read.
#[derive(Debug, Clone)]
pub(crate) enum BatchInput {
    Loaded(SourceDocument),
    File(DocumentFile),
}

impl BatchInput {
    fn document_id(&self) -> String {
        match self {
            BatchInput::Loaded(doc) => doc.id.clone(),
            BatchInput::File(file) => file.id.clone(),
        }
    }

    async fn load(self) -> Result<SourceDocument, DocumentError> {
        match self {
            BatchInput::Loaded(doc) => Ok(doc),
            BatchInput::File(file) => input::load_file(&file).await,
        }
    }
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Extract one document.
///
/// # Errors
/// Only an invalid configuration is fatal. Unreadable or unparsable content
/// is reported through [`DocumentOutput::error`].
pub async fn extract(
    doc: SourceDocument,
    config: &ExtractionConfig,
) -> Result<DocumentOutput, ExtractError> {
    let extractor = Extractor::new(config.clone())?;
    Ok(extractor.extract(doc).await)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    doc: SourceDocument,
    config: &ExtractionConfig,
) -> Result<DocumentOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(doc, config))
}

/// Extract a batch of in-memory documents.
///
/// Documents run concurrently (up to `config.concurrency`); the result keeps
/// input order.
pub async fn extract_batch(
    documents: Vec<SourceDocument>,
    config: &ExtractionConfig,
) -> Result<BatchOutput, ExtractError> {
    let extractor = Extractor::new(config.clone())?;
    let items = documents.into_iter().map(BatchInput::Loaded).collect();
    Ok(run_batch(&extractor, items).await)
}

/// Extract every document file found under `dir`.
pub async fn extract_dir(
    dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<BatchOutput, ExtractError> {
    let extractor = Extractor::new(config.clone())?;
    let files = input::discover_documents(dir.as_ref()).await?;
    let items = files.into_iter().map(BatchInput::File).collect();
    Ok(run_batch(&extractor, items).await)
}

/// Extract every document under `input_dir` and write one
/// `{document_id}.json` per document into `output_dir`.
///
/// Failed documents still get a file holding an empty array.
pub async fn extract_to_dir(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<BatchOutput, ExtractError> {
    let batch = extract_dir(input_dir, config).await?;
    for doc in &batch.documents {
        write_document(doc, output_dir.as_ref()).await?;
    }
    Ok(batch)
}

/// Write the artifact array of `doc` to `{dir}/{document_id}.json`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_document(doc: &DocumentOutput, dir: &Path) -> Result<PathBuf, ExtractError> {
    let path = dir.join(format!("{}.json", doc.document_id));
    let json = serde_json::to_vec_pretty(&doc.artifacts)
        .map_err(|e| ExtractError::Serialization(e.to_string()))?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    debug!("Wrote {} record(s) to {}", doc.artifacts.len(), path.display());
    Ok(path)
}

async fn run_batch(extractor: &Extractor, items: Vec<BatchInput>) -> BatchOutput {
    let start = Instant::now();
    let total = items.len();
    let config = extractor.config();
    info!("Starting batch: {} document(s), concurrency {}", total, config.concurrency);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut indexed: Vec<(usize, DocumentOutput)> =
        stream::iter(items.into_iter().enumerate().map(|(i, item)| {
            let extractor = extractor.clone();
            async move { (i, extractor.process(item).await) }
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;
    indexed.sort_by_key(|(i, _)| *i);
    let documents: Vec<DocumentOutput> = indexed.into_iter().map(|(_, d)| d).collect();

    let mut stats = BatchStats::from_documents(&documents);
    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Batch complete: {}/{} document(s), {} image(s), {} table(s), {}ms",
        stats.processed_documents,
        stats.total_documents,
        stats.total_images,
        stats.total_tables,
        stats.duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, stats.processed_documents);
    }

    BatchOutput { documents, stats }
}
