//! Durable store collaborators.
//!
//! The store is used through a single call, [`ResultStore::insert`]. Schema
//! management belongs to the store's owner. [`SupabaseStore`] talks to a
//! PostgREST endpoint; [`NoopStore`] is used by the CLI's `--no-store` mode.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::pipeline::persist::PersistedRecord;
use crate::remote::error_body;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A sink for analysis records. One insert per request, no transactions.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Write one record.
    async fn insert(&self, record: &PersistedRecord) -> Result<(), StoreError>;
}

/// Inserts rows through the PostgREST API of a Supabase project.
pub struct SupabaseStore {
    http: reqwest::Client,
    config: StoreConfig,
}

impl SupabaseStore {
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| StoreError::Unreachable {
                detail: e.to_string(),
            })?;
        Ok(Self { http, config })
    }

    fn insert_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.url.trim_end_matches('/'),
            self.config.table
        )
    }
}

#[async_trait]
impl ResultStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn insert(&self, record: &PersistedRecord) -> Result<(), StoreError> {
        let url = self.insert_url();
        debug!("Inserting record for '{}' into {}", record.image_name, url);

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::Unreachable {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = error_body(response, "empty response body".to_string()).await;
            Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Discards every record.
pub struct NoopStore;

#[async_trait]
impl ResultStore for NoopStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn insert(&self, _record: &PersistedRecord) -> Result<(), StoreError> {
        Ok(())
    }
}
