//! Result types produced by an analysis request.

use crate::config::AnalysisProfile;
use crate::error::StoreError;
use serde::{Deserialize, Serialize};

/// A point in the remote service's native page coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A selection mark in state `selected`.
///
/// Coordinates are left exactly as the service reports them; scaling to a
/// display surface is the renderer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckedRegion {
    /// 1-indexed page number.
    pub page: u32,
    pub polygon: Vec<Point>,
}

/// Normalised outcome of a succeeded job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Extracted plain text; empty when the service returned none.
    pub text: String,
    /// Number of pages; 1 when the service omitted the page list.
    pub page_count: usize,
    /// Always empty for [`AnalysisProfile::Read`].
    pub checked_regions: Vec<CheckedRegion>,
}

/// Whether the store write succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistenceStatus {
    Stored,
    Failed { error: StoreError },
}

impl PersistenceStatus {
    pub fn is_stored(&self) -> bool {
        matches!(self, PersistenceStatus::Stored)
    }
}

/// Everything a successful request returns to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub profile: AnalysisProfile,
    pub result: AnalysisResult,
    pub persistence: PersistenceStatus,
    /// Wall-clock time from submission to extracted result.
    pub duration_ms: u64,
    /// Status queries issued before the job reached `succeeded`.
    pub poll_attempts: u32,
}

impl AnalysisOutcome {
    /// Warning text for a degraded outcome, `None` when the record was stored.
    pub fn warning(&self) -> Option<String> {
        match &self.persistence {
            PersistenceStatus::Stored => None,
            PersistenceStatus::Failed { error } => Some(format!(
                "OCR succeeded, but saving the result failed: {error}"
            )),
        }
    }
}
