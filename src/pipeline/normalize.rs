//! Payload normalisation: decide, per declared media type, what bytes are
//! actually sent to the analysis service.
//!
//! | Declared type              | Action                         | Sent as          |
//! |----------------------------|--------------------------------|------------------|
//! | `application/pdf`          | pass through                   | `application/pdf`|
//! | `image/tiff`               | pass through                   | `image/tiff`     |
//! | any other `image/*`        | recompress, JPEG quality 60    | `image/jpeg`     |
//! | anything else              | reject `UnsupportedMediaType`  | —                |
//!
//! PDF is never recompressed (lossy and pointless), and TIFF may carry
//! several frames that a single JPEG cannot represent. Photos straight from
//! a phone camera are often 5–10 MB; a quality-60 baseline JPEG keeps the
//! upload small without hurting recognition.

use crate::error::OcrError;
use crate::pipeline::input::InboundDocument;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

/// Bytes ready for the submit call, plus the content type they represent.
#[derive(Debug, Clone)]
pub struct NormalizedPayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// What [`normalize`] will do with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeAction {
    PassThrough,
    Recompress,
}

/// Lower-cased media type without parameters (`image/PNG; q=1` → `image/png`).
fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Pick the action for a declared media type.
///
/// Rejection happens here, before any bytes are decoded or sent.
pub fn decide(media_type: &str, compress_images: bool) -> Result<NormalizeAction, OcrError> {
    let mt = essence(media_type);
    if mt == "application/pdf" || mt == "image/tiff" {
        Ok(NormalizeAction::PassThrough)
    } else if mt.starts_with("image/") {
        if compress_images {
            Ok(NormalizeAction::Recompress)
        } else {
            Ok(NormalizeAction::PassThrough)
        }
    } else {
        Err(OcrError::UnsupportedMediaType {
            media_type: media_type.to_string(),
        })
    }
}

/// Normalise a document for transmission.
///
/// Recompression is CPU-bound, so it runs in `spawn_blocking` to keep the
/// async worker threads free for other requests.
pub async fn normalize(
    doc: &InboundDocument,
    compress_images: bool,
    jpeg_quality: u8,
) -> Result<NormalizedPayload, OcrError> {
    match decide(doc.media_type(), compress_images)? {
        NormalizeAction::PassThrough => {
            debug!(
                "Passing {} through unchanged ({} bytes)",
                doc.media_type(),
                doc.len()
            );
            Ok(NormalizedPayload {
                bytes: doc.bytes().to_vec(),
                content_type: doc.media_type().to_string(),
            })
        }
        NormalizeAction::Recompress => {
            let input = doc.bytes().to_vec();
            let original_len = input.len();
            let bytes = tokio::task::spawn_blocking(move || recompress_jpeg(&input, jpeg_quality))
                .await
                .map_err(|e| OcrError::Internal(format!("Recompression task panicked: {e}")))?
                .map_err(|e| OcrError::InvalidImage {
                    detail: e.to_string(),
                })?;

            debug!(
                "Recompressed {} → image/jpeg: {} → {} bytes",
                doc.media_type(),
                original_len,
                bytes.len()
            );
            Ok(NormalizedPayload {
                bytes,
                content_type: "image/jpeg".to_string(),
            })
        }
    }
}

/// Decode any supported raster image and re-encode it as baseline JPEG.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn recompress_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let rgb = img.to_rgb8();

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(&rgb)?;
    Ok(buf)
}
