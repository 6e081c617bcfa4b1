//! Inbound documents, and loading them from a path or URL for the CLI.
//!
//! The HTTP surface builds an [`InboundDocument`] straight from the upload;
//! the CLI goes through [`resolve_input`], which reads a local file or
//! downloads a URL into memory. Nothing is written to disk either way.

use crate::error::OcrError;
use std::path::Path;
use tracing::{debug, info};

/// One user-submitted document. Owned by the orchestrator for the duration
/// of a single request and dropped when it completes.
#[derive(Debug, Clone)]
pub struct InboundDocument {
    bytes: Vec<u8>,
    media_type: String,
    file_name: String,
}

impl InboundDocument {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The media type exactly as the client declared it.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a CLI argument (local path or HTTP/HTTPS URL) to a document.
///
/// `media_type` overrides whatever would be guessed from the file extension
/// or the response's `Content-Type`.
pub async fn resolve_input(
    input: &str,
    media_type: Option<&str>,
    timeout_secs: u64,
) -> Result<InboundDocument, OcrError> {
    let mut doc = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };
    if let Some(mt) = media_type {
        doc.media_type = mt.to_string();
    }
    Ok(doc)
}

async fn read_local(path_str: &str) -> Result<InboundDocument, OcrError> {
    let path = Path::new(path_str);
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => OcrError::FileNotFound {
            path: path_str.to_string(),
        },
        _ => OcrError::Internal(format!("failed to read '{path_str}': {e}")),
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());
    let media_type = guess_media_type(&file_name);

    debug!("Read local document {} ({} bytes, {})", path.display(), bytes.len(), media_type);
    Ok(InboundDocument::new(bytes, media_type, file_name))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<InboundDocument, OcrError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| OcrError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| OcrError::DownloadFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !response.status().is_success() {
        return Err(OcrError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let file_name = filename_from_url(url);
    let media_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty() && v != "application/octet-stream")
        .unwrap_or_else(|| guess_media_type(&file_name).to_string());

    let bytes = response.bytes().await.map_err(|e| OcrError::DownloadFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    info!("Downloaded {} bytes ({})", bytes.len(), media_type);
    Ok(InboundDocument::new(bytes.to_vec(), media_type, file_name))
}

/// Last path segment of the URL, or a generic name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "document".to_string()
}

/// Media type from a file extension; `application/octet-stream` when unknown.
pub fn guess_media_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "tif" | "tiff" => "image/tiff",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}
