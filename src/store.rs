//! Asset persistence: save the bytes behind an image's resolved source.
//!
//! The extractor only ever sees the [`AssetStore`] trait. [`FsAssetStore`]
//! is the filesystem implementation; tests inject their own.
//!
//! Three source forms are supported, each with its own strategy:
//!
//! | Form | Example | Strategy |
//! |------|---------|----------|
//! | inline data | `data:image/png;base64,iVBOR…` | decode |
//! | network address | `https://cdn.example.org/f1.jpg` | fetch |
//! | local path | `/corpus/PMC1/f1.jpg` | copy |

use crate::error::{ExtractError, PersistError};
use crate::pipeline::resolve::{asset_file_name, is_inline_data, is_network_address};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for fetching remote assets.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Persists image assets for extracted artifacts.
///
/// `save` returns the saved location, or `None` on any failure. It must
/// never panic; implementations log their own errors.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn save(
        &self,
        document_id: &str,
        artifact_id: &str,
        resolved_source: &str,
    ) -> Option<String>;
}

/// Stores assets under `{root}/{document_id}/{artifact_id}.{ext}`.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
    client: reqwest::Client,
}

impl FsAssetStore {
    /// Store rooted at `root` with the default fetch timeout.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ExtractError> {
        Self::with_timeout(root, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    pub fn with_timeout(root: impl Into<PathBuf>, timeout: Duration) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            root: root.into(),
            client,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fallible core of [`AssetStore::save`]: returns the location relative
    /// to the store root.
    pub async fn persist(
        &self,
        document_id: &str,
        artifact_id: &str,
        resolved_source: &str,
    ) -> Result<String, PersistError> {
        let (bytes, ext) = if is_inline_data(resolved_source) {
            decode_inline(resolved_source)?
        } else if is_network_address(resolved_source) {
            self.fetch(resolved_source).await?
        } else {
            read_local(Path::new(resolved_source)).await?
        };

        let dir = self.root.join(document_id);
        tokio::fs::create_dir_all(&dir).await?;
        let file_name = format!("{artifact_id}.{ext}");
        tokio::fs::write(dir.join(&file_name), &bytes).await?;
        debug!("Saved {} ({} bytes) for {}", file_name, bytes.len(), document_id);
        Ok(format!("{document_id}/{file_name}"))
    }

    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, String), PersistError> {
        let failed = |reason: String| PersistError::FetchFailed {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| failed(e.to_string()))?
            .to_vec();
        let ext = extension_of(url)
            .or_else(|| sniff_extension(&bytes))
            .unwrap_or_else(|| "bin".to_string());
        Ok((bytes, ext))
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn save(
        &self,
        document_id: &str,
        artifact_id: &str,
        resolved_source: &str,
    ) -> Option<String> {
        match self.persist(document_id, artifact_id, resolved_source).await {
            Ok(location) => Some(location),
            Err(e) => {
                warn!("{}: asset not saved: {}", artifact_id, e);
                None
            }
        }
    }
}

// ── Source strategies ────────────────────────────────────────────────────

/// Decode a `data:[<mime>][;…];base64,<payload>` URI.
///
/// Whitespace inside the payload is ignored. The extension comes from the
/// MIME subtype, else from sniffing the bytes, else `bin`.
pub fn decode_inline(uri: &str) -> Result<(Vec<u8>, String), PersistError> {
    let body = uri.get(5..).unwrap_or_default();
    let (header, payload) = body
        .split_once(',')
        .ok_or_else(|| PersistError::MalformedInlineData("missing ',' separator".into()))?;
    let mut params = header.split(';');
    let mime = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(PersistError::UnsupportedInlineEncoding);
    }

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| PersistError::MalformedInlineData(e.to_string()))?;
    if bytes.is_empty() {
        return Err(PersistError::MalformedInlineData("empty payload".into()));
    }

    let ext = mime_extension(&mime)
        .map(str::to_string)
        .or_else(|| sniff_extension(&bytes))
        .unwrap_or_else(|| "bin".to_string());
    Ok((bytes, ext))
}

async fn read_local(path: &Path) -> Result<(Vec<u8>, String), PersistError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(PersistError::MissingLocalFile {
            path: path.to_path_buf(),
        });
    }
    let bytes = tokio::fs::read(path).await?;
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .or_else(|| sniff_extension(&bytes))
        .unwrap_or_else(|| "bin".to_string());
    Ok((bytes, ext))
}

fn mime_extension(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/tiff" => Some("tif"),
        "image/bmp" => Some("bmp"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}

fn sniff_extension(bytes: &[u8]) -> Option<String> {
    image::guess_format(bytes)
        .ok()
        .and_then(|f| f.extensions_str().first().map(|e| e.to_string()))
}

/// Lowercased extension of the last URL segment, if it looks like one.
fn extension_of(url: &str) -> Option<String> {
    let name = asset_file_name(url)?;
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_ascii_lowercase())
}
