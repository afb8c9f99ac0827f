//! Output types: artifact records, per-document results and batch statistics.
//!
//! [`ArtifactRecord`] is the durable unit. One document yields one ordered
//! collection of records (images first, then tables), wrapped in a
//! [`DocumentOutput`] that also carries article metadata and, when the
//! document could not be processed, the [`DocumentError`] explaining why.

use crate::error::DocumentError;
use crate::pipeline::classify::Dialect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    Table,
}

impl ArtifactKind {
    /// Segment used in artifact ids.
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Image => "image",
            ArtifactKind::Table => "table",
        }
    }
}

/// One extracted figure/image or table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub document_id: String,
    /// `{document_id}_{kind}_{ordinal}`, ordinal starting at 1 per kind.
    pub artifact_id: String,
    pub kind: ArtifactKind,
    /// Caption text with any leading "Figure N:" / "Table N." label removed.
    pub caption: String,
    #[serde(flatten)]
    pub detail: ArtifactDetail,
    /// Paragraphs that cite this artifact explicitly, first-seen order, no duplicates.
    pub citing_paragraphs: Vec<String>,
    /// Paragraphs related by shared informative terms; never also citing.
    pub contextual_paragraphs: Vec<ContextualParagraph>,
}

/// Kind-specific record fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactDetail {
    Image(ImageDetail),
    Table(TableDetail),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDetail {
    /// Attribute value exactly as found in the markup.
    pub source_reference: String,
    /// Absolute path, network address or untouched `data:` URI.
    pub resolved_source: String,
    pub alt_text: String,
    /// Location returned by the asset store; empty when not persisted.
    pub saved_location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDetail {
    /// Cells joined by the configured separator, rows by `\n`.
    pub body_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_markup: Option<String>,
    /// Sorted informative terms of caption and body.
    pub informative_terms: BTreeSet<String>,
}

/// A paragraph matched by term overlap, with the terms it shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextualParagraph {
    pub text: String,
    pub matched_terms: BTreeSet<String>,
}

impl ArtifactRecord {
    pub fn image(&self) -> Option<&ImageDetail> {
        match &self.detail {
            ArtifactDetail::Image(d) => Some(d),
            ArtifactDetail::Table(_) => None,
        }
    }

    pub fn table(&self) -> Option<&TableDetail> {
        match &self.detail {
            ArtifactDetail::Table(d) => Some(d),
            ArtifactDetail::Image(_) => None,
        }
    }
}

/// Bibliographic metadata of an article. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
}

/// Result of extracting one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentOutput {
    pub document_id: String,
    /// Classification of the raw content; `None` when it could not be read.
    pub dialect: Option<Dialect>,
    pub metadata: ArticleMetadata,
    /// Ordered artifact records. Empty (never absent) for artifact-free or failed documents.
    pub artifacts: Vec<ArtifactRecord>,
    /// Why the document produced nothing, if it failed.
    pub error: Option<DocumentError>,
}

impl DocumentOutput {
    /// Zero-artifact result for a document that could not be processed.
    pub fn failed(error: DocumentError, dialect: Option<Dialect>) -> Self {
        Self {
            document_id: error.document_id().to_string(),
            dialect,
            metadata: ArticleMetadata::default(),
            artifacts: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn image_count(&self) -> usize {
        self.artifacts.iter().filter(|a| a.kind == ArtifactKind::Image).count()
    }

    pub fn table_count(&self) -> usize {
        self.artifacts.iter().filter(|a| a.kind == ArtifactKind::Table).count()
    }

    /// Images whose asset was persisted.
    pub fn saved_count(&self) -> usize {
        self.artifacts
            .iter()
            .filter_map(ArtifactRecord::image)
            .filter(|d| !d.saved_location.is_empty())
            .count()
    }
}

/// Aggregate numbers for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_documents: usize,
    pub processed_documents: usize,
    pub failed_documents: usize,
    pub total_images: usize,
    pub total_tables: usize,
    pub saved_assets: usize,
    pub duration_ms: u64,
}

impl BatchStats {
    /// Tally `documents`; `duration_ms` is left for the caller.
    pub fn from_documents(documents: &[DocumentOutput]) -> Self {
        Self {
            total_documents: documents.len(),
            processed_documents: documents.iter().filter(|d| d.is_ok()).count(),
            failed_documents: documents.iter().filter(|d| !d.is_ok()).count(),
            total_images: documents.iter().map(DocumentOutput::image_count).sum(),
            total_tables: documents.iter().map(DocumentOutput::table_count).sum(),
            saved_assets: documents.iter().map(DocumentOutput::saved_count).sum(),
            duration_ms: 0,
        }
    }
}

/// Every document of a batch, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutput {
    pub documents: Vec<DocumentOutput>,
    pub stats: BatchStats,
}

/// How many records have each optional field filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub records: usize,
    pub with_caption: usize,
    pub with_alt_text: usize,
    pub with_citing: usize,
    pub with_contextual: usize,
    pub with_saved_location: usize,
}

impl BatchOutput {
    pub fn summary(&self) -> BatchSummary {
        let mut s = BatchSummary::default();
        for record in self.documents.iter().flat_map(|d| d.artifacts.iter()) {
            s.records += 1;
            s.with_caption += usize::from(!record.caption.is_empty());
            s.with_citing += usize::from(!record.citing_paragraphs.is_empty());
            s.with_contextual += usize::from(!record.contextual_paragraphs.is_empty());
            if let Some(img) = record.image() {
                s.with_alt_text += usize::from(!img.alt_text.is_empty());
                s.with_saved_location += usize::from(!img.saved_location.is_empty());
            }
        }
        s
    }
}
