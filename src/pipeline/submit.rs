//! Submission: POST the normalised payload and read back the job handle.
//!
//! The service answers `202 Accepted` with an `Operation-Location` header
//! naming the job. A success response without that header is a contract
//! violation, not a transient condition, so it is never retried.

use crate::config::{AnalysisProfile, AnalyzerConfig};
use crate::error::OcrError;
use crate::pipeline::normalize::NormalizedPayload;
use crate::remote::error_body;
use reqwest::header::CONTENT_TYPE;
use std::fmt;
use tracing::{debug, info, warn};

/// Header carrying the subscription key on every remote call.
pub const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Response header carrying the job handle.
pub const OPERATION_LOCATION_HEADER: &str = "Operation-Location";

/// Opaque, server-assigned URL used to poll one analysis job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `{endpoint}/formrecognizer/documentModels/{model}:analyze?api-version={version}`
pub fn analyze_url(endpoint: &str, profile: AnalysisProfile, api_version: &str) -> String {
    format!(
        "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
        endpoint.trim_end_matches('/'),
        profile.model_id(),
        api_version
    )
}

/// Send `payload` to the analysis endpoint for `profile`.
///
/// The body is always sent as `application/octet-stream`; the service
/// sniffs the real format itself.
pub async fn submit(
    http: &reqwest::Client,
    config: &AnalyzerConfig,
    payload: NormalizedPayload,
    profile: AnalysisProfile,
) -> Result<JobHandle, OcrError> {
    let url = analyze_url(&config.endpoint, profile, &config.api_version);
    info!(
        "Submitting {} bytes ({}) to {}",
        payload.bytes.len(),
        payload.content_type,
        profile.model_id()
    );

    let response = http
        .post(&url)
        .header(API_KEY_HEADER, &config.api_key)
        .header(CONTENT_TYPE, "application/octet-stream")
        .body(payload.bytes)
        .send()
        .await
        .map_err(|e| OcrError::Http {
            stage: "submit",
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = error_body(
            response,
            format!("Analysis service rejected the document with HTTP {}", status.as_u16()),
        )
        .await;
        warn!("Analysis service rejected submission: HTTP {}: {}", status, body);
        return Err(OcrError::SubmissionRejected {
            status: status.as_u16(),
            body,
        });
    }

    let location = response
        .headers()
        .get(OPERATION_LOCATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(OcrError::MissingJobHandle)?;

    debug!("Job accepted: {}", location);
    Ok(JobHandle::new(location))
}
