//! # docscan
//!
//! Turn an uploaded document (photo, PDF or TIFF) into extracted text by
//! driving a remote, asynchronous document-analysis service.
//!
//! ## Why this crate?
//!
//! The analysis service does not answer synchronously: a submit call returns
//! a job handle, and the caller has to poll it until the job finishes. This
//! crate wraps that dance in a bounded, retry-free state machine that fits
//! inside a single request/response cycle, normalises uploads before they
//! are sent, and records every result in a durable store without letting a
//! store outage throw away a successful analysis.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Normalise  PDF/TIFF as-is, other images → JPEG q60 (spawn_blocking)
//!  ├─ 2. Submit     POST …/documentModels/{model}:analyze → Operation-Location
//!  ├─ 3. Poll       GET Operation-Location every 1 s, at most 30 times
//!  ├─ 4. Extract    text, page count, selected checkbox regions (layout)
//!  ├─ 5. Persist    one row with metadata + raw result
//!  └─ 6. Respond    {"text": …} or {"error": …}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docscan::{Analyzer, AnalyzerConfig, InboundDocument, StoreConfig, SupabaseStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // AZURE_ENDPOINT / AZURE_API_KEY / SUPABASE_URL / SUPABASE_SERVICE_KEY
//!     let config = AnalyzerConfig::from_env()?;
//!     let store = Arc::new(SupabaseStore::new(StoreConfig::from_env()?)?);
//!     let analyzer = Analyzer::new(config, store)?;
//!
//!     let bytes = std::fs::read("receipt.jpg")?;
//!     let doc = InboundDocument::new(bytes, "image/jpeg", "receipt.jpg");
//!     let outcome = analyzer.analyze(doc, None).await?;
//!     println!("{}", outcome.result.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum router for `POST /api/ocr` |
//! | `cli`    | on      | Enables the `docscan` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod remote;
#[cfg(feature = "server")]
pub mod server;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::Analyzer;
pub use config::{AnalysisProfile, AnalyzerConfig, AnalyzerConfigBuilder, PersistencePolicy, StoreConfig};
pub use error::{OcrError, StoreError};
pub use output::{AnalysisOutcome, AnalysisResult, CheckedRegion, PersistenceStatus, Point};
pub use pipeline::input::InboundDocument;
pub use pipeline::persist::PersistedRecord;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use store::{NoopStore, ResultStore, SupabaseStore};
