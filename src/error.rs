//! Error types for the figctx library.
//!
//! Three error types match three failure scopes:
//!
//! * [`ExtractError`] — **Fatal**: the batch cannot start or its output sink
//!   cannot be written (invalid configuration, missing input directory).
//!   Returned as `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`DocumentError`] — **Non-fatal**: one document could not be read or
//!   parsed. Stored inside [`crate::output::DocumentOutput`], which then
//!   carries an empty artifact collection; the rest of the batch continues.
//!
//! * [`PersistError`] — **Non-fatal**: one asset could not be saved by
//!   [`crate::store::FsAssetStore`]. Logged and reduced to an empty
//!   `saved_location`; the artifact record itself is unaffected.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the figctx library.
///
/// Document-level failures use [`DocumentError`] and are stored in
/// [`crate::output::DocumentOutput`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file or directory was not found at the given path.
    #[error("Input not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// The input directory exists but could not be listed.
    #[error("Failed to list input directory '{path}': {source}")]
    InputListFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two input files map to the same document id.
    #[error("Document id '{id}' is shared by several files under '{dir}'")]
    DuplicateDocumentId { id: String, dir: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output record file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Records could not be serialised to JSON.
    #[error("Failed to serialise records: {0}")]
    Serialization(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// The document is reported with zero artifacts; the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The document bytes could not be read from their source.
    #[error("Document '{document_id}': unreadable: {detail}")]
    Unreadable { document_id: String, detail: String },

    /// The document is not valid UTF-8 text.
    #[error("Document '{document_id}': content is not valid UTF-8")]
    Undecodable { document_id: String },

    /// Neither the primary nor the fallback parser produced a tree.
    #[error("Document '{document_id}': unparsable markup: {detail}")]
    Unparsable { document_id: String, detail: String },
}

impl DocumentError {
    /// Identifier of the document this error belongs to.
    pub fn document_id(&self) -> &str {
        match self {
            DocumentError::Unreadable { document_id, .. }
            | DocumentError::Undecodable { document_id }
            | DocumentError::Unparsable { document_id, .. } => document_id,
        }
    }
}

/// Failure to persist one asset.
#[derive(Debug, Error)]
pub enum PersistError {
    /// `data:` URI without a `,` separator or with a bad base64 payload.
    #[error("malformed inline data: {0}")]
    MalformedInlineData(String),

    /// `data:` URI that is not base64-encoded.
    #[error("unsupported inline encoding (only base64 is accepted)")]
    UnsupportedInlineEncoding,

    /// Remote fetch failed or returned a non-success status.
    #[error("fetch failed for '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// Local source path does not exist.
    #[error("local file not found: '{path}'")]
    MissingLocalFile { path: PathBuf },

    /// Writing into the store failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}
