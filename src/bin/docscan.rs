//! CLI binary for docscan.
//!
//! `docscan serve` runs the HTTP surface; `docscan analyze` pushes a single
//! local file or URL through the same pipeline and prints the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docscan::pipeline::input::resolve_input;
use docscan::server::{self, DEFAULT_MAX_UPLOAD_BYTES};
use docscan::{
    AnalysisProfile, AnalysisProgressCallback, Analyzer, AnalyzerConfig, NoopStore,
    PersistencePolicy, ProgressCallback, ResultStore, Stage, StoreConfig, SupabaseStore,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that follows the request through its stages.
struct SpinnerCallback {
    bar: ProgressBar,
}

impl SpinnerCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for SpinnerCallback {
    fn on_stage(&self, stage: Stage) {
        let (prefix, msg) = match stage {
            Stage::ReceivingInput => ("Reading", "document"),
            Stage::Normalizing => ("Normalising", "payload"),
            Stage::Submitting => ("Submitting", "to analysis service"),
            Stage::Polling => ("Waiting", "for analysis"),
            Stage::Extracting => ("Extracting", "text"),
            Stage::Persisting => ("Saving", "result"),
            Stage::Done => {
                self.bar.finish_and_clear();
                eprintln!("{} analysis complete", green("✔"));
                return;
            }
        };
        self.bar.set_prefix(prefix);
        self.bar.set_message(msg);
    }

    fn on_poll_attempt(&self, attempt: u32, max_attempts: u32) {
        self.bar
            .set_message(format!("status check {attempt}/{max_attempts}"));
    }

    fn on_persistence_degraded(&self, error: &str) {
        self.bar
            .println(format!("  {} result not saved: {}", cyan("⚠"), error));
    }

    fn on_failed(&self, stage: Stage, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} failed while {}: {}", red("✘"), stage, error);
    }
}

// ── Arguments ────────────────────────────────────────────────────────────────

/// Extract text from scanned documents with an asynchronous analysis service.
#[derive(Parser, Debug)]
#[command(
    name = "docscan",
    version,
    about = "Extract text from photos, PDFs and TIFFs via a remote document-analysis service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto
)]
struct Cli {
    #[command(flatten)]
    remote: RemoteArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCSCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCSCAN_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct RemoteArgs {
    /// Analysis service base URL.
    #[arg(long, global = true, env = "AZURE_ENDPOINT", hide_env_values = true)]
    endpoint: Option<String>,

    /// Analysis service subscription key.
    #[arg(long, global = true, env = "AZURE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Default analysis profile: read or layout.
    #[arg(long, global = true, env = "DOCSCAN_PROFILE", value_enum, default_value = "read")]
    profile: ProfileArg,

    /// Milliseconds between status checks.
    #[arg(long, global = true, env = "DOCSCAN_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Maximum status checks per job.
    #[arg(long, global = true, env = "DOCSCAN_MAX_POLLS", default_value_t = 30)]
    max_polls: u32,

    /// JPEG quality for recompressed images (1–100).
    #[arg(long, global = true, env = "DOCSCAN_JPEG_QUALITY", default_value_t = 60,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Send images unchanged instead of recompressing them to JPEG.
    #[arg(long, global = true, env = "DOCSCAN_NO_COMPRESS")]
    no_compress: bool,

    /// What a failed store write does: degrade (still return text) or strict (fail).
    #[arg(long, global = true, env = "DOCSCAN_PERSISTENCE_POLICY", value_enum, default_value = "degrade")]
    persistence_policy: PolicyArg,

    /// Store project URL.
    #[arg(long, global = true, env = "SUPABASE_URL", hide_env_values = true)]
    store_url: Option<String>,

    /// Store service key.
    #[arg(long, global = true, env = "SUPABASE_SERVICE_KEY", hide_env_values = true)]
    store_key: Option<String>,

    /// Results table.
    #[arg(long, global = true, env = "DOCSCAN_TABLE", default_value = "ocr_results")]
    table: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (POST /api/ocr).
    Serve {
        /// Address to listen on.
        #[arg(long, env = "DOCSCAN_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// Maximum upload size in bytes.
        #[arg(long, env = "DOCSCAN_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
        max_upload_bytes: usize,
    },
    /// Analyse one local file or HTTP/HTTPS URL and print the result as JSON.
    Analyze {
        /// Local file path or URL.
        input: String,

        /// Override the declared media type (otherwise guessed).
        #[arg(long)]
        media_type: Option<String>,

        /// Do not write the result to the store.
        #[arg(long)]
        no_store: bool,

        /// Print only the extracted text instead of JSON.
        #[arg(long)]
        text: bool,

        /// Download timeout for URL inputs in seconds.
        #[arg(long, default_value_t = 120)]
        download_timeout: u64,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ProfileArg {
    Read,
    Layout,
}

impl From<ProfileArg> for AnalysisProfile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Read => AnalysisProfile::Read,
            ProfileArg::Layout => AnalysisProfile::Layout,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Degrade,
    Strict,
}

impl From<PolicyArg> for PersistencePolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Degrade => PersistencePolicy::Degrade,
            PolicyArg::Strict => PersistencePolicy::Strict,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && matches!(cli.command, Command::Analyze { .. });
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Serve {
            bind,
            max_upload_bytes,
        } => {
            let config = build_config(&cli.remote, None)?;
            let store = build_store(&cli.remote, false)?;
            let analyzer = Arc::new(Analyzer::new(config, store).context("Failed to build analyzer")?);

            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("Failed to bind {bind}"))?;
            info!("Listening on http://{}/api/ocr", listener.local_addr()?);

            axum::serve(listener, server::router(analyzer, *max_upload_bytes))
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP server error")?;
        }
        Command::Analyze {
            input,
            media_type,
            no_store,
            text,
            download_timeout,
        } => {
            let progress: Option<ProgressCallback> = if show_progress {
                Some(SpinnerCallback::new() as ProgressCallback)
            } else {
                None
            };
            let config = build_config(&cli.remote, progress)?;
            let store = build_store(&cli.remote, *no_store)?;
            let analyzer = Analyzer::new(config, store).context("Failed to build analyzer")?;

            let doc = resolve_input(input, media_type.as_deref(), *download_timeout)
                .await
                .with_context(|| format!("Failed to load '{input}'"))?;
            let outcome = analyzer.analyze(doc, None).await.context("Analysis failed")?;

            if *text {
                println!("{}", outcome.result.text);
            } else {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&outcome).context("Failed to serialise output")?
                );
            }

            if !cli.quiet {
                eprintln!(
                    "   {} pages  /  {} status checks  /  {}ms",
                    dim(&outcome.result.page_count.to_string()),
                    dim(&outcome.poll_attempts.to_string()),
                    outcome.duration_ms,
                );
            }
        }
    }

    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
fn build_config(args: &RemoteArgs, progress: Option<ProgressCallback>) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .endpoint(args.endpoint.clone().unwrap_or_default())
        .api_key(args.api_key.clone().unwrap_or_default())
        .profile(args.profile.into())
        .poll_interval_ms(args.poll_interval_ms)
        .max_poll_attempts(args.max_polls)
        .jpeg_quality(args.jpeg_quality)
        .compress_images(!args.no_compress)
        .persistence_policy(args.persistence_policy.into());

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder
        .build()
        .context("Invalid configuration (set AZURE_ENDPOINT and AZURE_API_KEY)")
}

fn build_store(args: &RemoteArgs, no_store: bool) -> Result<Arc<dyn ResultStore>> {
    if no_store {
        return Ok(Arc::new(NoopStore));
    }
    let (Some(url), Some(key)) = (&args.store_url, &args.store_key) else {
        anyhow::bail!(
            "Store is not configured: set SUPABASE_URL and SUPABASE_SERVICE_KEY, or pass --no-store"
        );
    };
    let config = StoreConfig::new(url, key).with_table(&args.table);
    let store = SupabaseStore::new(config).context("Failed to build store client")?;
    Ok(Arc::new(store))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
