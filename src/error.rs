//! Error types for the docscan library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`OcrError`]: **Fatal**: the request cannot produce an analysis at all
//!   (no file, unsupported type, remote rejection, remote failure, timeout).
//!   Returned as `Err(OcrError)` from [`crate::analyze::Analyzer::analyze`]
//!   and rendered to the caller as `{"error": "..."}` with
//!   [`OcrError::status_code`].
//!
//! * [`StoreError`]: **Non-fatal**: the analysis succeeded but the durable
//!   store refused the record. Stored inside
//!   [`crate::output::PersistenceStatus`] so the caller still receives the
//!   extracted text, unless [`crate::config::PersistencePolicy::Strict`]
//!   promotes it to [`OcrError::PersistenceFailed`].

use thiserror::Error;

/// All fatal errors returned by the docscan library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The inbound request carried no file part.
    #[error("No file uploaded")]
    NoFileUploaded,

    /// The declared media type is neither an image, a PDF nor a TIFF.
    #[error("Unsupported file type: {media_type}")]
    UnsupportedMediaType { media_type: String },

    /// The document claimed to be an image but could not be decoded.
    #[error("Image could not be decoded: {detail}")]
    InvalidImage { detail: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    // ── Remote analysis errors ────────────────────────────────────────────
    /// The analysis endpoint answered the submit call with a non-success
    /// status. The body is the only diagnostic the service gives, so it is
    /// surfaced verbatim.
    #[error("{body}")]
    SubmissionRejected { status: u16, body: String },

    /// Submit succeeded but carried no `Operation-Location` header.
    #[error("No Operation-Location")]
    MissingJobHandle,

    /// A poll request came back with a non-success status.
    #[error("Polling the analysis job failed with HTTP {status}: {body}")]
    PollRejected { status: u16, body: String },

    /// A remote payload did not match the expected schema.
    #[error("Malformed response from analysis service: {detail}")]
    MalformedPayload { detail: String },

    /// The remote service declared the job permanently failed.
    #[error("OCR failed{}", failure_suffix(.detail))]
    RemoteAnalysisFailed { detail: Option<String> },

    /// The poll budget ran out before the job reached a terminal state.
    /// The job's true outcome is unknown.
    #[error("OCR did not finish after {attempts} status checks; outcome unknown")]
    PollingTimedOut { attempts: u32 },

    /// Transport-level failure talking to the remote service.
    #[error("HTTP error during {stage}: {reason}")]
    Http { stage: &'static str, reason: String },

    // ── Persistence ───────────────────────────────────────────────────────
    /// Analysis succeeded, but the durable store write failed and the
    /// configured policy treats that as fatal.
    #[error("OCR succeeded, but saving the result failed: {reason}")]
    PersistenceFailed { reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or environment validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// HTTP status the inbound surface answers with for this failure.
    ///
    /// `SubmissionRejected` propagates the remote status; anything the
    /// remote reports that is not a valid status falls back to 502.
    pub fn status_code(&self) -> u16 {
        match self {
            OcrError::NoFileUploaded
            | OcrError::UnsupportedMediaType { .. }
            | OcrError::InvalidImage { .. }
            | OcrError::FileNotFound { .. } => 400,
            OcrError::SubmissionRejected { status, .. } => {
                if (100..=999).contains(status) {
                    *status
                } else {
                    502
                }
            }
            OcrError::PollRejected { .. } | OcrError::MalformedPayload { .. } => 502,
            OcrError::DownloadFailed { .. }
            | OcrError::MissingJobHandle
            | OcrError::RemoteAnalysisFailed { .. }
            | OcrError::PollingTimedOut { .. }
            | OcrError::Http { .. }
            | OcrError::PersistenceFailed { .. }
            | OcrError::InvalidConfig(_)
            | OcrError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            OcrError::NoFileUploaded => "no_file_uploaded",
            OcrError::UnsupportedMediaType { .. } => "unsupported_media_type",
            OcrError::InvalidImage { .. } => "invalid_image",
            OcrError::FileNotFound { .. } => "file_not_found",
            OcrError::DownloadFailed { .. } => "download_failed",
            OcrError::SubmissionRejected { .. } => "submission_rejected",
            OcrError::MissingJobHandle => "missing_job_handle",
            OcrError::PollRejected { .. } => "poll_rejected",
            OcrError::MalformedPayload { .. } => "malformed_payload",
            OcrError::RemoteAnalysisFailed { .. } => "remote_analysis_failed",
            OcrError::PollingTimedOut { .. } => "polling_timed_out",
            OcrError::Http { .. } => "http",
            OcrError::PersistenceFailed { .. } => "persistence_failed",
            OcrError::InvalidConfig(_) => "invalid_config",
            OcrError::Internal(_) => "unexpected_internal_error",
        }
    }
}

fn failure_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// A non-fatal failure writing to the durable store.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("store rejected insert with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The store could not be reached.
    #[error("store unreachable: {detail}")]
    Unreachable { detail: String },

    /// The record could not be serialised.
    #[error("record serialisation failed: {detail}")]
    Serialization { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_rejected_displays_body_verbatim() {
        let e = OcrError::SubmissionRejected {
            status: 403,
            body: "quota exceeded".into(),
        };
        assert_eq!(e.to_string(), "quota exceeded");
        assert_eq!(e.status_code(), 403);
    }

    #[test]
    fn submission_rejected_with_bogus_status_is_bad_gateway() {
        let e = OcrError::SubmissionRejected {
            status: 0,
            body: String::new(),
        };
        assert_eq!(e.status_code(), 502);
    }

    #[test]
    fn input_errors_are_client_errors() {
        assert_eq!(OcrError::NoFileUploaded.status_code(), 400);
        assert_eq!(OcrError::NoFileUploaded.to_string(), "No file uploaded");
        let e = OcrError::UnsupportedMediaType {
            media_type: "text/plain".into(),
        };
        assert_eq!(e.status_code(), 400);
        assert!(e.to_string().contains("text/plain"));
    }

    #[test]
    fn timeout_is_distinct_from_failure() {
        let timeout = OcrError::PollingTimedOut { attempts: 30 };
        let failed = OcrError::RemoteAnalysisFailed { detail: None };
        assert_eq!(timeout.status_code(), 500);
        assert_eq!(failed.status_code(), 500);
        assert_ne!(timeout.kind(), failed.kind());
        assert!(timeout.to_string().contains("30"));
        assert_eq!(failed.to_string(), "OCR failed");
    }

    #[test]
    fn remote_failure_includes_detail_when_present() {
        let e = OcrError::RemoteAnalysisFailed {
            detail: Some("InvalidContent".into()),
        };
        assert_eq!(e.to_string(), "OCR failed: InvalidContent");
    }

    #[test]
    fn store_error_display() {
        let e = StoreError::Rejected {
            status: 409,
            body: "duplicate key".into(),
        };
        assert!(e.to_string().contains("409"));
        assert!(e.to_string().contains("duplicate key"));
    }
}
