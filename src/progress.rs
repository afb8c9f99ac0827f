//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the batch driver works through its documents.
//!
//! # Example
//!
//! ```rust
//! use figctx::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     artifacts: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, document_id: &str, artifact_count: usize) {
//!         let total = self.artifacts.fetch_add(artifact_count, Ordering::SeqCst) + artifact_count;
//!         eprintln!("{document_id}: {artifact_count} artifact(s), {total} so far");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { artifacts: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch driver as it processes each document.
///
/// Documents are processed concurrently, so `on_document_*` methods may be
/// called from different threads at once. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any document is processed.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document is parsed.
    fn on_document_start(&self, document_id: &str) {
        let _ = document_id;
    }

    /// Called when a document has been extracted, including documents with
    /// zero artifacts.
    fn on_document_complete(&self, document_id: &str, artifact_count: usize) {
        let _ = (document_id, artifact_count);
    }

    /// Called when a document could not be read or parsed.
    fn on_document_error(&self, document_id: &str, error: &str) {
        let _ = (document_id, error);
    }

    /// Called once after every document has been attempted.
    ///
    /// # Arguments
    /// * `total_documents` — documents in the batch
    /// * `success_count`   — documents extracted without error
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
