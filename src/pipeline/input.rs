//! Input discovery: find article files on disk and load their bytes.
//!
//! Documents are identified by file stem, so `PMC123.html` becomes
//! `PMC123`. When a directory holds several files with the same stem
//! (`PMC1.html` and `PMC1.xml`), each of them is renamed to
//! `{stem}_{extension}` and, failing that, to its relative path. Loading
//! never fails the batch: an unreadable file becomes a
//! [`DocumentError::Unreadable`] for that document alone.

use crate::error::{DocumentError, ExtractError};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions recognised as article documents (compared case-insensitively).
pub const DOCUMENT_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "xml"];

/// Raw input to the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Stable identifier, usually the file stem.
    pub id: String,
    /// Where the bytes came from; relative asset references resolve against it.
    pub location: Option<PathBuf>,
    pub content: Vec<u8>,
}

impl SourceDocument {
    /// A document held in memory with no filesystem location.
    pub fn from_bytes(id: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            location: None,
            content: content.into(),
        }
    }

    /// Builder-style setter for the document's own path.
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// A discovered document file and the id it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub path: PathBuf,
    pub id: String,
}

/// Identifier of the document stored at `path`: the file name without its
/// last extension.
pub fn document_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// `true` if `path` has one of [`DOCUMENT_EXTENSIONS`].
pub fn is_document_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DOCUMENT_EXTENSIONS.iter().any(|d| e.eq_ignore_ascii_case(d)))
}

/// Walk `dir` recursively and return every document file, sorted by path,
/// each with a document id unique within the batch.
///
/// # Errors
/// [`ExtractError::DuplicateDocumentId`] if two files still share an id
/// after renaming.
pub async fn discover_documents(dir: &Path) -> Result<Vec<DocumentFile>, ExtractError> {
    if !dir.is_dir() {
        return Err(ExtractError::InputNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries =
            tokio::fs::read_dir(&current)
                .await
                .map_err(|e| ExtractError::InputListFailed {
                    path: current.clone(),
                    source: e,
                })?;
        while let Some(entry) =
            entries
                .next_entry()
                .await
                .map_err(|e| ExtractError::InputListFailed {
                    path: current.clone(),
                    source: e,
                })?
        {
            let path = entry.path();
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => pending.push(path),
                Ok(_) if is_document_path(&path) => found.push(path),
                Ok(_) => {}
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
    }

    found.sort();
    debug!("Discovered {} document(s) under {}", found.len(), dir.display());
    assign_ids(dir, found)
}

fn assign_ids(dir: &Path, paths: Vec<PathBuf>) -> Result<Vec<DocumentFile>, ExtractError> {
    let mut ids: Vec<String> = paths.iter().map(|p| document_id(p)).collect();
    let renames: [fn(&Path, &Path) -> String; 2] = [extension_id, relative_id];
    for rename in renames {
        let clashing = clashing_ids(&ids);
        if clashing.is_empty() {
            break;
        }
        for (id, path) in ids.iter_mut().zip(&paths) {
            if clashing.contains(id.as_str()) {
                let renamed = rename(dir, path);
                warn!("Document id '{}' is shared; {} becomes '{}'", id, path.display(), renamed);
                *id = renamed;
            }
        }
    }
    if let Some(id) = clashing_ids(&ids).into_iter().next() {
        return Err(ExtractError::DuplicateDocumentId {
            id,
            dir: dir.to_path_buf(),
        });
    }

    Ok(paths
        .into_iter()
        .zip(ids)
        .map(|(path, id)| DocumentFile { path, id })
        .collect())
}

fn clashing_ids(ids: &[String]) -> BTreeSet<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in ids {
        *counts.entry(id.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, _)| id.to_string())
        .collect()
}

/// `PMC1.xml` → `PMC1_xml`.
fn extension_id(_dir: &Path, path: &Path) -> String {
    match path.extension() {
        Some(ext) => format!(
            "{}_{}",
            document_id(path),
            ext.to_string_lossy().to_ascii_lowercase()
        ),
        None => document_id(path),
    }
}

/// `sub/PMC1.xml` → `sub_PMC1_xml`.
fn relative_id(dir: &Path, path: &Path) -> String {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Read the file at `path` into a [`SourceDocument`] identified by its stem.
pub async fn load_document(path: &Path) -> Result<SourceDocument, DocumentError> {
    load_document_as(path, document_id(path)).await
}

/// Read a discovered file under its assigned id.
pub async fn load_file(file: &DocumentFile) -> Result<SourceDocument, DocumentError> {
    load_document_as(&file.path, file.id.clone()).await
}

async fn load_document_as(path: &Path, id: String) -> Result<SourceDocument, DocumentError> {
    match tokio::fs::read(path).await {
        Ok(content) => Ok(SourceDocument {
            id,
            location: Some(path.to_path_buf()),
            content,
        }),
        Err(e) => Err(DocumentError::Unreadable {
            document_id: id,
            detail: format!("{}: {}", path.display(), e),
        }),
    }
}
