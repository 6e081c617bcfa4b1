//! Inbound HTTP surface: `POST /api/ocr` (multipart) and `GET /healthz`.
//!
//! The handler only turns the multipart form into an [`InboundDocument`],
//! hands it to the shared [`Analyzer`], and renders the outcome:
//!
//! * success → `200 {"text": …, "stored": true}`; layout requests add
//!   `"checkRegions"`; a degraded store write adds `"warning"` and
//!   `"stored": false`
//! * failure → `{"error": …}` with [`OcrError::status_code`]

use crate::analyze::Analyzer;
use crate::config::AnalysisProfile;
use crate::error::OcrError;
use crate::output::{AnalysisOutcome, CheckedRegion};
use crate::pipeline::input::InboundDocument;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Form field carrying the document.
pub const FILE_FIELD: &str = "file";

/// Optional form field selecting `read` or `layout`.
pub const PROFILE_FIELD: &str = "profile";

/// Default inbound body limit: 50 MiB, the remote service's own upload cap.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OcrResponse<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    check_regions: Option<&'a [CheckedRegion]>,
    stored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

/// Build the application router around a shared analyzer.
pub fn router(analyzer: Arc<Analyzer>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/ocr", post(handle_ocr))
        .route("/healthz", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(analyzer)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn handle_ocr(
    State(analyzer): State<Arc<Analyzer>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let form = match multipart {
        Ok(mp) => read_form(mp).await,
        Err(rejection) => {
            debug!("Request is not a multipart form: {}", rejection.body_text());
            Err(FormError::Ocr(OcrError::NoFileUploaded))
        }
    };

    let (doc, profile) = match form {
        Ok(parsed) => parsed,
        Err(FormError::Ocr(e)) => return error_response(&e),
        Err(FormError::BadRequest(status, message)) => {
            return (status, Json(json!({ "error": message }))).into_response();
        }
    };

    match analyzer.analyze(doc, profile).await {
        Ok(outcome) => (StatusCode::OK, Json(success_body(&outcome))).into_response(),
        Err(e) => error_response(&e),
    }
}

enum FormError {
    Ocr(OcrError),
    BadRequest(StatusCode, String),
}

/// Pull the document and optional profile out of the form.
///
/// The `file` field wins; otherwise the first part with a file name is used.
/// An empty part (a browser form submitted with nothing selected) counts as
/// no file.
async fn read_form(
    mut multipart: Multipart,
) -> Result<(InboundDocument, Option<AnalysisProfile>), FormError> {
    let mut doc: Option<InboundDocument> = None;
    let mut profile: Option<AnalysisProfile> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(FormError::BadRequest(e.status(), e.body_text())),
        };

        let name = field.name().unwrap_or_default().to_string();
        if name == PROFILE_FIELD {
            let value = field
                .text()
                .await
                .map_err(|e| FormError::BadRequest(e.status(), e.body_text()))?;
            let parsed = value.parse::<AnalysisProfile>().map_err(|_| {
                FormError::BadRequest(
                    StatusCode::BAD_REQUEST,
                    format!("Unknown profile '{}' (expected read or layout)", value.trim()),
                )
            })?;
            profile = Some(parsed);
            continue;
        }

        let is_file_part = name == FILE_FIELD || field.file_name().is_some();
        if doc.is_some() || !is_file_part {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or("upload")
            .to_string();
        let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| FormError::BadRequest(e.status(), e.body_text()))?;

        if bytes.is_empty() {
            warn!("Ignoring empty file part '{}'", name);
            continue;
        }
        doc = Some(InboundDocument::new(bytes.to_vec(), media_type, file_name));
    }

    let doc = doc.ok_or(FormError::Ocr(OcrError::NoFileUploaded))?;
    Ok((doc, profile))
}

fn success_body(outcome: &AnalysisOutcome) -> serde_json::Value {
    let check_regions = match outcome.profile {
        AnalysisProfile::Layout => Some(outcome.result.checked_regions.as_slice()),
        AnalysisProfile::Read => None,
    };
    let body = OcrResponse {
        text: &outcome.result.text,
        check_regions,
        stored: outcome.persistence.is_stored(),
        warning: outcome.warning(),
    };
    serde_json::to_value(body).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

fn error_response(e: &OcrError) -> Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::output::{AnalysisResult, PersistenceStatus, Point};

    fn outcome(profile: AnalysisProfile, persistence: PersistenceStatus) -> AnalysisOutcome {
        AnalysisOutcome {
            profile,
            result: AnalysisResult {
                text: "Hello".into(),
                page_count: 1,
                checked_regions: vec![CheckedRegion {
                    page: 1,
                    polygon: vec![Point { x: 1.0, y: 2.0 }],
                }],
            },
            persistence,
            duration_ms: 10,
            poll_attempts: 2,
        }
    }

    #[test]
    fn read_body_has_only_text_and_stored() {
        let body = success_body(&outcome(AnalysisProfile::Read, PersistenceStatus::Stored));
        assert_eq!(body, json!({"text": "Hello", "stored": true}));
    }

    #[test]
    fn layout_body_includes_check_regions() {
        let body = success_body(&outcome(AnalysisProfile::Layout, PersistenceStatus::Stored));
        assert_eq!(body["checkRegions"][0]["page"], 1);
        assert_eq!(body["checkRegions"][0]["polygon"][0]["x"], 1.0);
        assert_eq!(body["checkRegions"][0]["polygon"][0]["y"], 2.0);
    }

    #[test]
    fn degraded_body_carries_warning() {
        let failed = PersistenceStatus::Failed {
            error: StoreError::Unreachable {
                detail: "timeout".into(),
            },
        };
        let body = success_body(&outcome(AnalysisProfile::Read, failed));
        assert_eq!(body["text"], "Hello");
        assert_eq!(body["stored"], false);
        assert!(body["warning"].as_str().unwrap().contains("timeout"));
    }

    #[test]
    fn error_status_mapping() {
        let r = error_response(&OcrError::SubmissionRejected {
            status: 403,
            body: "quota exceeded".into(),
        });
        assert_eq!(r.status(), StatusCode::FORBIDDEN);
        let r = error_response(&OcrError::NoFileUploaded);
        assert_eq!(r.status(), StatusCode::BAD_REQUEST);
        let r = error_response(&OcrError::PollingTimedOut { attempts: 30 });
        assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
