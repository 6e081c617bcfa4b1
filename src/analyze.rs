//! Request orchestration.
//!
//! [`Analyzer::analyze`] walks one document through
//! `ReceivingInput → Normalizing → Submitting → Polling → Extracting →
//! Persisting → Done`. The first failure short-circuits the rest and is
//! returned as an [`OcrError`]; a store failure after a successful
//! extraction is handled by [`PersistencePolicy`] instead.
//!
//! One `Analyzer` is built at start-up and shared (`Arc`) by every request.
//! It holds only read-only configuration, a pooled HTTP client and the store
//! handle, so concurrent requests never share mutable state.

use crate::config::{AnalysisProfile, AnalyzerConfig, PersistencePolicy};
use crate::error::OcrError;
use crate::output::{AnalysisOutcome, PersistenceStatus};
use crate::pipeline::input::InboundDocument;
use crate::pipeline::poll::PollPolicy;
use crate::pipeline::{extract, normalize, persist, poll, submit};
use crate::progress::Stage;
use crate::store::ResultStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Sequences the pipeline stages for each request.
pub struct Analyzer {
    http: reqwest::Client,
    config: AnalyzerConfig,
    store: Arc<dyn ResultStore>,
}

impl Analyzer {
    /// Build an analyzer with its own pooled HTTP client.
    pub fn new(config: AnalyzerConfig, store: Arc<dyn ResultStore>) -> Result<Self, OcrError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OcrError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config, store })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyse one document end to end.
    ///
    /// `profile` overrides the configured default for this request only.
    ///
    /// # Errors
    /// Every failure up to and including extraction is fatal and returned
    /// unchanged. A store failure is fatal only under
    /// [`PersistencePolicy::Strict`]; otherwise the outcome carries
    /// [`PersistenceStatus::Failed`].
    pub async fn analyze(
        &self,
        doc: InboundDocument,
        profile: Option<AnalysisProfile>,
    ) -> Result<AnalysisOutcome, OcrError> {
        let profile = profile.unwrap_or(self.config.default_profile);
        let mut stage = Stage::ReceivingInput;
        self.enter(stage);

        let result = self.run(&doc, profile, &mut stage).await;
        match &result {
            Ok(outcome) => {
                self.enter(Stage::Done);
                info!(
                    "Analysed '{}' with {} in {}ms ({} chars, stored: {})",
                    doc.file_name(),
                    profile,
                    outcome.duration_ms,
                    outcome.result.text.len(),
                    outcome.persistence.is_stored()
                );
            }
            Err(e) => {
                error!(
                    kind = e.kind(),
                    stage = %stage,
                    "Analysis of '{}' failed: {}",
                    doc.file_name(),
                    e
                );
                if let Some(cb) = &self.config.progress_callback {
                    cb.on_failed(stage, &e.to_string());
                }
            }
        }
        result
    }

    async fn run(
        &self,
        doc: &InboundDocument,
        profile: AnalysisProfile,
        stage: &mut Stage,
    ) -> Result<AnalysisOutcome, OcrError> {
        let start = Instant::now();
        info!(
            "Received '{}' ({}, {} bytes), profile {}",
            doc.file_name(),
            doc.media_type(),
            doc.len(),
            profile
        );

        // ── Step 1: Normalise payload ────────────────────────────────────
        self.advance(stage, Stage::Normalizing);
        let payload =
            normalize::normalize(doc, self.config.compress_images, self.config.jpeg_quality)
                .await?;

        // ── Step 2: Submit ───────────────────────────────────────────────
        self.advance(stage, Stage::Submitting);
        let handle = submit::submit(&self.http, &self.config, payload, profile).await?;

        // ── Step 3: Poll until terminal ──────────────────────────────────
        self.advance(stage, Stage::Polling);
        let job = poll::poll_until_terminal(
            &self.http,
            &handle,
            &self.config.api_key,
            PollPolicy::from(&self.config),
            self.config.progress_callback.as_ref(),
        )
        .await?;

        // ── Step 4: Extract ──────────────────────────────────────────────
        self.advance(stage, Stage::Extracting);
        let result = extract::extract(job.result.as_ref(), profile);
        let duration_ms = start.elapsed().as_millis() as u64;

        // ── Step 5: Persist ──────────────────────────────────────────────
        self.advance(stage, Stage::Persisting);
        let record = persist::PersistedRecord::new(doc, profile, &result, job.raw, Utc::now());
        let persistence = persist::persist(self.store.as_ref(), &record).await;

        if let PersistenceStatus::Failed { error } = &persistence {
            match self.config.persistence_policy {
                PersistencePolicy::Strict => {
                    return Err(OcrError::PersistenceFailed {
                        reason: error.to_string(),
                    });
                }
                PersistencePolicy::Degrade => {
                    warn!("Returning analysis of '{}' without a stored record", doc.file_name());
                    if let Some(cb) = &self.config.progress_callback {
                        cb.on_persistence_degraded(&error.to_string());
                    }
                }
            }
        }

        Ok(AnalysisOutcome {
            profile,
            result,
            persistence,
            duration_ms,
            poll_attempts: job.attempts,
        })
    }

    fn advance(&self, stage: &mut Stage, next: Stage) {
        *stage = next;
        self.enter(next);
    }

    fn enter(&self, stage: Stage) {
        debug!("Entering stage {}", stage);
        if let Some(cb) = &self.config.progress_callback {
            cb.on_stage(stage);
        }
    }
}
