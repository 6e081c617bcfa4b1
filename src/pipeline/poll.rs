//! Polling: query a job handle until it is terminal or the budget runs out.
//!
//! ## Policy
//!
//! Fixed interval, fixed attempt count, no backoff and no jitter: wait
//! `interval`, query, repeat at most `max_attempts` times. With the defaults
//! (1 s × 30) a request never holds its inbound connection longer than about
//! thirty seconds of polling. Attempts are strictly sequential.
//!
//! | `status`              | Outcome                                  |
//! |-----------------------|------------------------------------------|
//! | `succeeded`           | return the typed result + raw payload    |
//! | `failed`              | `RemoteAnalysisFailed`, stop immediately |
//! | anything else         | keep polling                             |
//! | budget exhausted      | `PollingTimedOut` (outcome unknown)      |

use crate::config::AnalyzerConfig;
use crate::error::OcrError;
use crate::pipeline::submit::{JobHandle, API_KEY_HEADER};
use crate::progress::ProgressCallback;
use crate::remote::{error_body, AnalyzeResult, JobStatus};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Bounded fixed-interval polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 30,
        }
    }
}

impl From<&AnalyzerConfig> for PollPolicy {
    fn from(config: &AnalyzerConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_attempts: config.max_poll_attempts,
        }
    }
}

/// A job observed in state `succeeded`.
#[derive(Debug, Clone)]
pub struct SucceededJob {
    /// Typed view of `analyzeResult`, `None` when the service omitted it.
    pub result: Option<AnalyzeResult>,
    /// `analyzeResult` exactly as received (`null` when absent).
    pub raw: Value,
    /// Number of status queries issued, including the terminal one.
    pub attempts: u32,
}

/// Poll `handle` until it reaches a terminal state.
///
/// Returns as soon as a terminal status is seen; no further request is made
/// for the handle after that.
pub async fn poll_until_terminal(
    http: &reqwest::Client,
    handle: &JobHandle,
    api_key: &str,
    policy: PollPolicy,
    progress: Option<&ProgressCallback>,
) -> Result<SucceededJob, OcrError> {
    for attempt in 1..=policy.max_attempts {
        sleep(policy.interval).await;

        if let Some(cb) = progress {
            cb.on_poll_attempt(attempt, policy.max_attempts);
        }

        let body = fetch_status(http, handle, api_key).await?;
        let status = JobStatus::deserialize(&body).map_err(|e| OcrError::MalformedPayload {
            detail: format!("poll response: {e}"),
        })?;

        match status {
            JobStatus::Succeeded { analyze_result } => {
                info!("Job succeeded after {} status checks", attempt);
                let raw = match body {
                    Value::Object(mut map) => map.remove("analyzeResult").unwrap_or(Value::Null),
                    _ => Value::Null,
                };
                return Ok(SucceededJob {
                    result: analyze_result,
                    raw,
                    attempts: attempt,
                });
            }
            JobStatus::Failed { error } => {
                let detail = error.and_then(|e| e.describe());
                warn!(
                    "Job failed remotely after {} status checks: {}",
                    attempt,
                    detail.as_deref().unwrap_or("no detail")
                );
                return Err(OcrError::RemoteAnalysisFailed { detail });
            }
            other => {
                debug!(
                    "Poll {}/{}: job still in progress ({:?})",
                    attempt, policy.max_attempts, other
                );
            }
        }
    }

    warn!(
        "Job did not finish within {} status checks; giving up",
        policy.max_attempts
    );
    Err(OcrError::PollingTimedOut {
        attempts: policy.max_attempts,
    })
}

async fn fetch_status(
    http: &reqwest::Client,
    handle: &JobHandle,
    api_key: &str,
) -> Result<Value, OcrError> {
    let response = http
        .get(handle.as_str())
        .header(API_KEY_HEADER, api_key)
        .send()
        .await
        .map_err(|e| OcrError::Http {
            stage: "poll",
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = error_body(response, "empty response body".to_string()).await;
        return Err(OcrError::PollRejected {
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await.map_err(|e| OcrError::Http {
        stage: "poll",
        reason: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| OcrError::MalformedPayload {
        detail: format!("poll response is not JSON: {e}"),
    })
}
