//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `gtm_detect` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Printing one JSON report per URL
//!
//! All core functionality is implemented in the library crate.

use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::StreamExt;

use gtm_detect::app::{log_progress, read_url_list};
use gtm_detect::config::{DEFAULT_CONCURRENCY, DEFAULT_USER_AGENT};
use gtm_detect::initialization::init_logger_with;
use gtm_detect::{scan_stream, BatchSummary, DetectorConfig, GtmDetector, LogFormat, LogLevel};

/// Progress is logged after this many completed URLs.
const PROGRESS_EVERY: usize = 25;

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Single site, static strategies only
/// gtm_detect example.com
///
/// # Render in headless Chrome first
/// gtm_detect https://shop.example --dynamic --pretty
///
/// # Batch from a file, 8 at a time
/// gtm_detect --file urls.txt --concurrency 8 > reports.jsonl
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "gtm_detect",
    about = "Detects Google Tag Manager on websites and extracts container IDs."
)]
struct Cli {
    /// URLs to scan (scheme optional)
    urls: Vec<String>,

    /// File with one URL per line (`#` starts a comment)
    #[arg(long, value_parser)]
    file: Option<PathBuf>,

    /// Render each page in headless Chrome before the static analysis
    #[arg(long)]
    dynamic: bool,

    /// Launch Chrome without its sandbox (for containers running as root)
    #[arg(long)]
    no_sandbox: bool,

    /// Page fetch timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_seconds: u64,

    /// Timeout for each relay configuration fetch in seconds
    #[arg(long, default_value_t = 10)]
    relay_timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Maximum concurrent detections
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Pretty-print each report instead of JSON Lines
    #[arg(long)]
    pretty: bool,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

impl Cli {
    fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            enable_dynamic: self.dynamic,
            fetch_timeout: Duration::from_secs(self.timeout_seconds),
            relay_timeout: Duration::from_secs(self.relay_timeout_seconds),
            user_agent: self.user_agent.clone(),
            browser_sandbox: !self.no_sandbox,
            ..Default::default()
        }
    }
}

async fn run(cli: Cli) -> Result<BatchSummary> {
    let mut urls = cli.urls.clone();
    if let Some(path) = &cli.file {
        let listed = read_url_list(path)
            .await
            .with_context(|| format!("Failed to read URL file {}", path.display()))?;
        urls.extend(listed);
    }
    if urls.is_empty() {
        bail!("No URLs given: pass them as arguments or with --file");
    }

    let detector =
        GtmDetector::new(cli.detector_config()).context("Failed to initialize detector")?;
    let total = urls.len();
    let start_time = Instant::now();
    let mut summary = BatchSummary::default();
    let stdout = std::io::stdout();

    let mut records = std::pin::pin!(scan_stream(&detector, urls, cli.concurrency));
    while let Some(record) = records.next().await {
        summary.record(&record.report);
        let line = if cli.pretty {
            serde_json::to_string_pretty(&record)
        } else {
            serde_json::to_string(&record)
        }
        .context("Failed to serialize report")?;
        let mut out = stdout.lock();
        writeln!(out, "{line}").context("Failed to write report")?;
        out.flush().context("Failed to flush stdout")?;

        if summary.scanned % PROGRESS_EVERY == 0 && summary.scanned < total {
            log_progress(start_time, summary.scanned, total);
        }
    }

    summary.log_summary(start_time.elapsed().as_secs_f64());
    Ok(summary)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    match run(cli).await {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("gtm_detect error: {:#}", e);
            process::exit(1);
        }
    }
}
