//! Wire schema of the remote analysis service.
//!
//! Poll responses are decoded into the sum type [`JobStatus`] instead of
//! being passed around as untyped JSON. A body without a `status` field, or
//! whose `analyzeResult` does not have the expected shape, is rejected as
//! [`crate::error::OcrError::MalformedPayload`] by the poller.
//!
//! Only the fields this crate reads are modelled; everything else the
//! service sends is ignored here and kept in the raw payload that is
//! persisted for reprocessing.

use serde::{Deserialize, Serialize};

/// Status of one remote analysis job, tagged by its `status` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum JobStatus {
    NotStarted,
    Running,
    Succeeded {
        #[serde(rename = "analyzeResult", default)]
        analyze_result: Option<AnalyzeResult>,
    },
    Failed {
        #[serde(default)]
        error: Option<RemoteError>,
    },
    /// Any status value this crate does not know. Treated as still in progress.
    #[serde(other)]
    Unknown,
}

/// Body of a non-success response, for use as an error message.
///
/// Returns the body verbatim when it has any content. An empty body yields
/// `fallback`; an unreadable one yields `fallback` plus the read error.
pub(crate) async fn error_body(response: reqwest::Response, fallback: String) -> String {
    match response.text().await {
        Ok(body) if !body.trim().is_empty() => body,
        Ok(_) => fallback,
        Err(e) => format!("{fallback} (body unreadable: {e})"),
    }
}

/// Error object attached to a failed job.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemoteError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RemoteError {
    /// `"<code>: <message>"`, or whichever half is present.
    pub fn describe(&self) -> Option<String> {
        match (&self.code, &self.message) {
            (Some(c), Some(m)) => Some(format!("{c}: {m}")),
            (Some(c), None) => Some(c.clone()),
            (None, Some(m)) => Some(m.clone()),
            (None, None) => None,
        }
    }
}

/// The `analyzeResult` object of a succeeded job.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    /// Full extracted text in reading order.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub pages: Option<Vec<AnalyzedPage>>,
}

/// One page of an analysis result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedPage {
    /// 1-indexed page number.
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub selection_marks: Vec<SelectionMark>,
}

/// A checkbox-like region detected by the layout model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SelectionMark {
    pub state: MarkState,
    /// Flat `[x1, y1, x2, y2, …]` polygon in the page's native unit.
    #[serde(default)]
    pub polygon: Vec<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkState {
    Selected,
    Unselected,
    #[serde(other)]
    Unknown,
}
