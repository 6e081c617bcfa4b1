//! Progress-callback trait for per-request analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalyzerConfigBuilder::progress_callback`] to observe a
//! request as it walks through the [`Stage`] sequence.
//!
//! # Why callbacks instead of channels?
//!
//! Callers can forward events to a terminal spinner, a metrics sink or a log
//! without the library knowing how the host application communicates. The
//! trait is `Send + Sync` because one [`crate::analyze::Analyzer`] serves many
//! concurrent requests.
//!
//! # Example
//!
//! ```rust
//! use docscan::{AnalysisProgressCallback, AnalyzerConfig};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct PollCounter(AtomicU32);
//!
//! impl AnalysisProgressCallback for PollCounter {
//!     fn on_poll_attempt(&self, attempt: u32, max_attempts: u32) {
//!         self.0.store(attempt, Ordering::SeqCst);
//!         eprintln!("status check {attempt}/{max_attempts}");
//!     }
//! }
//!
//! let config = AnalyzerConfig::builder()
//!     .endpoint("https://example.cognitiveservices.azure.com")
//!     .api_key("k")
//!     .progress_callback(Arc::new(PollCounter(AtomicU32::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The strictly sequential states of one analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    ReceivingInput,
    Normalizing,
    Submitting,
    Polling,
    Extracting,
    Persisting,
    Done,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::ReceivingInput => "receiving_input",
            Stage::Normalizing => "normalizing",
            Stage::Submitting => "submitting",
            Stage::Polling => "polling",
            Stage::Extracting => "extracting",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Called by the orchestrator as a request advances.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called when the request enters `stage`.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called just before each status query.
    ///
    /// # Arguments
    /// * `attempt`     : 1-indexed attempt number
    /// * `max_attempts`: the configured poll budget
    fn on_poll_attempt(&self, attempt: u32, max_attempts: u32) {
        let _ = (attempt, max_attempts);
    }

    /// Called when the store write failed but the analysis is still returned.
    fn on_persistence_degraded(&self, error: &str) {
        let _ = error;
    }

    /// Called once when the request fails in `stage`.
    fn on_failed(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalyzerConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
