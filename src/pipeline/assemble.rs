//! Record assembly: one [`ArtifactRecord`] per resolved candidate.
//!
//! Images come first, then tables; each kind is numbered from 1 in discovery
//! order. `saved_location` is left empty here and filled in afterwards by
//! the asset store, if one is configured.

use crate::config::ExtractionConfig;
use crate::output::{ArtifactDetail, ArtifactKind, ArtifactRecord, ImageDetail, TableDetail};
use crate::pipeline::boilerplate::ParagraphSet;
use crate::pipeline::context::{associate, informative_terms, ArtifactKey};
use crate::pipeline::dom::Dom;
use crate::pipeline::locate::{is_decorative, ArtifactCandidate, CandidateKind};
use crate::pipeline::resolve::{asset_file_name, resolve_image, resolve_table};
use std::path::Path;
use tracing::debug;

/// Everything about one document that record assembly reads.
pub struct DocumentView<'a> {
    pub document_id: &'a str,
    pub dom: &'a Dom,
    pub location: Option<&'a Path>,
    pub paragraphs: &'a ParagraphSet,
}

/// `{document_id}_{kind}_{ordinal}`.
pub fn artifact_id(document_id: &str, kind: ArtifactKind, ordinal: usize) -> String {
    format!("{}_{}_{}", document_id, kind.as_str(), ordinal)
}

/// Build the ordered record collection for one document.
pub fn assemble(
    view: &DocumentView<'_>,
    images: &[ArtifactCandidate],
    tables: &[ArtifactCandidate],
    config: &ExtractionConfig,
) -> Vec<ArtifactRecord> {
    let mut records = Vec::with_capacity(images.len() + tables.len());

    let resolved_images = images
        .iter()
        .map(|c| {
            let img = resolve_image(view.dom, c, view.location, config.caption_sibling_window);
            (c, img)
        })
        .filter(|(_, img)| !(config.skip_decorative_images && is_decorative(&img.source_reference)));

    for (i, (candidate, img)) in resolved_images.enumerate() {
        let ordinal = i + 1;
        let terms = informative_terms(&[&img.caption, &img.alt_text], &config.stop_words);
        let key = ArtifactKey {
            kind: CandidateKind::Image,
            number: img.number.unwrap_or(ordinal as u32),
            anchors: &img.anchors,
            file_name: asset_file_name(&img.resolved_source),
            terms: &terms,
            region: candidate.container.or(Some(candidate.node)),
            caption: &img.caption,
        };
        let assoc = associate(view.paragraphs, &key, config.min_context_terms);
        records.push(ArtifactRecord {
            document_id: view.document_id.to_string(),
            artifact_id: artifact_id(view.document_id, ArtifactKind::Image, ordinal),
            kind: ArtifactKind::Image,
            caption: img.caption,
            detail: ArtifactDetail::Image(ImageDetail {
                source_reference: img.source_reference,
                resolved_source: img.resolved_source,
                alt_text: img.alt_text,
                saved_location: String::new(),
            }),
            citing_paragraphs: assoc.citing,
            contextual_paragraphs: assoc.contextual,
        });
    }

    for (i, candidate) in tables.iter().enumerate() {
        let ordinal = i + 1;
        let table = resolve_table(
            view.dom,
            candidate,
            &config.cell_separator,
            config.keep_table_markup,
        );
        let terms = informative_terms(&[&table.caption, &table.body_text], &config.stop_words);
        let key = ArtifactKey {
            kind: CandidateKind::Table,
            number: table.number.unwrap_or(ordinal as u32),
            anchors: &table.anchors,
            file_name: None,
            terms: &terms,
            region: candidate.container.or(Some(candidate.node)),
            caption: &table.caption,
        };
        let assoc = associate(view.paragraphs, &key, config.min_context_terms);
        records.push(ArtifactRecord {
            document_id: view.document_id.to_string(),
            artifact_id: artifact_id(view.document_id, ArtifactKind::Table, ordinal),
            kind: ArtifactKind::Table,
            caption: table.caption,
            detail: ArtifactDetail::Table(TableDetail {
                body_text: table.body_text,
                structural_markup: table.structural_markup,
                informative_terms: terms,
            }),
            citing_paragraphs: assoc.citing,
            contextual_paragraphs: assoc.contextual,
        });
    }

    debug!(
        "{}: assembled {} record(s) from {} image and {} table candidate(s)",
        view.document_id,
        records.len(),
        images.len(),
        tables.len()
    );
    records
}
