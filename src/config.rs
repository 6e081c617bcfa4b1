//! Configuration types for document analysis.
//!
//! All remote-service behaviour is controlled through [`AnalyzerConfig`],
//! built via its [`AnalyzerConfigBuilder`]. The durable store has its own
//! [`StoreConfig`] because the store is an independent collaborator and the
//! CLI can run without one.
//!
//! Both are loaded once at start-up and shared read-only across requests.

use crate::error::OcrError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// API version sent with every analyze request.
pub const DEFAULT_API_VERSION: &str = "2023-07-31";

/// Default results table in the durable store.
pub const DEFAULT_TABLE: &str = "ocr_results";

/// Configuration for the remote analysis service and the orchestration around it.
///
/// # Example
/// ```rust
/// use docscan::{AnalysisProfile, AnalyzerConfig};
///
/// let config = AnalyzerConfig::builder()
///     .endpoint("https://example.cognitiveservices.azure.com")
///     .api_key("secret")
///     .profile(AnalysisProfile::Layout)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_poll_attempts, 30);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// Base URL of the analysis resource, e.g. `https://<name>.cognitiveservices.azure.com`.
    pub endpoint: String,

    /// Subscription key sent as `Ocp-Apim-Subscription-Key`.
    pub api_key: String,

    /// API version query parameter. Default: `2023-07-31`.
    pub api_version: String,

    /// Profile used when a request does not ask for one. Default: [`AnalysisProfile::Read`].
    pub default_profile: AnalysisProfile,

    /// Delay before every status query, in milliseconds. Default: 1000.
    pub poll_interval_ms: u64,

    /// Maximum number of status queries per job. Default: 30.
    ///
    /// Together with `poll_interval_ms` this bounds how long one inbound
    /// request can hold its connection open.
    pub max_poll_attempts: u32,

    /// Recompress non-PDF, non-TIFF images to JPEG before upload. Default: true.
    ///
    /// When false every `image/*` upload is sent unchanged with its declared type.
    pub compress_images: bool,

    /// JPEG quality used for recompression (1–100). Default: 60.
    pub jpeg_quality: u8,

    /// What to do when the store write fails after a successful analysis.
    pub persistence_policy: PersistencePolicy,

    /// Per-HTTP-call timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Optional observer for stage transitions and poll attempts.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            default_profile: AnalysisProfile::default(),
            poll_interval_ms: 1000,
            max_poll_attempts: 30,
            compress_images: true,
            jpeg_quality: 60,
            persistence_policy: PersistencePolicy::default(),
            request_timeout_secs: 30,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("default_profile", &self.default_profile)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("compress_images", &self.compress_images)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("persistence_policy", &self.persistence_policy)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load from `AZURE_ENDPOINT` / `AZURE_API_KEY`, with optional
    /// `DOCSCAN_PROFILE` and `DOCSCAN_PERSISTENCE_POLICY` overrides.
    pub fn from_env() -> Result<Self, OcrError> {
        let mut builder = Self::builder()
            .endpoint(require_env("AZURE_ENDPOINT")?)
            .api_key(require_env("AZURE_API_KEY")?);

        if let Some(profile) = optional_env("DOCSCAN_PROFILE") {
            builder = builder.profile(profile.parse()?);
        }
        if let Some(policy) = optional_env("DOCSCAN_PERSISTENCE_POLICY") {
            builder = builder.persistence_policy(policy.parse()?);
        }

        builder.build()
    }

    /// Polling delay as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Builder for [`AnalyzerConfig`].
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    pub fn profile(mut self, profile: AnalysisProfile) -> Self {
        self.config.default_profile = profile;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn max_poll_attempts(mut self, n: u32) -> Self {
        self.config.max_poll_attempts = n;
        self
    }

    pub fn compress_images(mut self, v: bool) -> Self {
        self.config.compress_images = v;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q;
        self
    }

    pub fn persistence_policy(mut self, policy: PersistencePolicy) -> Self {
        self.config.persistence_policy = policy;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, OcrError> {
        let c = &self.config;
        if c.endpoint.trim().is_empty() {
            return Err(OcrError::InvalidConfig(
                "analysis endpoint must not be empty".into(),
            ));
        }
        if !c.endpoint.starts_with("http://") && !c.endpoint.starts_with("https://") {
            return Err(OcrError::InvalidConfig(format!(
                "analysis endpoint must be an http(s) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.api_key.is_empty() {
            return Err(OcrError::InvalidConfig("API key must not be empty".into()));
        }
        if c.max_poll_attempts == 0 {
            return Err(OcrError::InvalidConfig(
                "max_poll_attempts must be ≥ 1".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(OcrError::InvalidConfig(
                "request_timeout_secs must be ≥ 1".into(),
            ));
        }
        if !(1..=100).contains(&c.jpeg_quality) {
            return Err(OcrError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        Ok(self.config)
    }
}

/// Connection settings for the durable store (a PostgREST endpoint).
#[derive(Clone)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://<ref>.supabase.co`.
    pub url: String,
    /// Service key, sent both as `apikey` and as a bearer token.
    pub service_key: String,
    /// Target table. Default: `ocr_results`.
    pub table: String,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .field("table", &self.table)
            .finish()
    }
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_key: service_key.into(),
            table: DEFAULT_TABLE.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Load from `SUPABASE_URL` / `SUPABASE_SERVICE_KEY`, with an optional
    /// `DOCSCAN_TABLE` override.
    pub fn from_env() -> Result<Self, OcrError> {
        let config = Self::new(
            require_env("SUPABASE_URL")?,
            require_env("SUPABASE_SERVICE_KEY")?,
        );
        Ok(match optional_env("DOCSCAN_TABLE") {
            Some(table) => config.with_table(table),
            None => config,
        })
    }
}

fn require_env(name: &str) -> Result<String, OcrError> {
    optional_env(name)
        .ok_or_else(|| OcrError::InvalidConfig(format!("environment variable {name} is not set")))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which remote model analyses the document, and therefore which
/// extraction rules apply to its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisProfile {
    /// Plain OCR (`prebuilt-read`). Never yields selection marks.
    #[default]
    Read,
    /// Layout-aware analysis (`prebuilt-layout`), including selection marks.
    Layout,
}

impl AnalysisProfile {
    /// Remote model identifier for this profile.
    pub fn model_id(self) -> &'static str {
        match self {
            AnalysisProfile::Read => "prebuilt-read",
            AnalysisProfile::Layout => "prebuilt-layout",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisProfile::Read => "read",
            AnalysisProfile::Layout => "layout",
        }
    }
}

impl fmt::Display for AnalysisProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisProfile {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" | "prebuilt-read" => Ok(AnalysisProfile::Read),
            "layout" | "prebuilt-layout" => Ok(AnalysisProfile::Layout),
            other => Err(OcrError::InvalidConfig(format!(
                "unknown analysis profile '{other}' (expected read or layout)"
            ))),
        }
    }
}

/// How a store failure after a successful analysis reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistencePolicy {
    /// Return the analysis anyway, flagged `stored: false` with a warning. (default)
    #[default]
    Degrade,
    /// Fail the request with [`OcrError::PersistenceFailed`].
    Strict,
}

impl FromStr for PersistencePolicy {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degrade" => Ok(PersistencePolicy::Degrade),
            "strict" => Ok(PersistencePolicy::Strict),
            other => Err(OcrError::InvalidConfig(format!(
                "unknown persistence policy '{other}' (expected degrade or strict)"
            ))),
        }
    }
}
