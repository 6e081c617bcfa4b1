//! Persistence: build the durable record and write it.
//!
//! A store failure here never turns a successful analysis into a failed
//! one by itself; [`persist`] reports it as a [`PersistenceStatus`] and the
//! orchestrator applies [`crate::config::PersistencePolicy`].

use crate::config::AnalysisProfile;
use crate::output::{AnalysisResult, PersistenceStatus};
use crate::pipeline::input::InboundDocument;
use crate::store::ResultStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

/// One row of the results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub created_at: DateTime<Utc>,
    pub image_name: String,
    pub ocr_text: String,
    pub metadata: RecordMetadata,
    /// `analyzeResult` as received, for auditing and reprocessing.
    pub raw_result: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub file_size: usize,
    pub file_type: String,
    pub azure_model: String,
    pub processed_date: DateTime<Utc>,
    pub pages: usize,
    /// Only present for the layout profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_regions: Option<usize>,
}

impl PersistedRecord {
    pub fn new(
        doc: &InboundDocument,
        profile: AnalysisProfile,
        result: &AnalysisResult,
        raw_result: Value,
        now: DateTime<Utc>,
    ) -> Self {
        let checked_regions = match profile {
            AnalysisProfile::Layout => Some(result.checked_regions.len()),
            AnalysisProfile::Read => None,
        };
        Self {
            created_at: now,
            image_name: doc.file_name().to_string(),
            ocr_text: result.text.clone(),
            metadata: RecordMetadata {
                file_size: doc.len(),
                file_type: doc.media_type().to_string(),
                azure_model: profile.model_id().to_string(),
                processed_date: now,
                pages: result.page_count,
                checked_regions,
            },
            raw_result,
        }
    }
}

/// Write `record`, reporting (not propagating) a store failure.
pub async fn persist(store: &dyn ResultStore, record: &PersistedRecord) -> PersistenceStatus {
    match store.insert(record).await {
        Ok(()) => {
            info!("Stored result for '{}' in {}", record.image_name, store.name());
            PersistenceStatus::Stored
        }
        Err(e) => {
            error!(
                "Failed to store result for '{}' in {}: {}",
                record.image_name,
                store.name(),
                e
            );
            PersistenceStatus::Failed { error: e }
        }
    }
}
