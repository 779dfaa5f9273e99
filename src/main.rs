//! Deadlink-Sweep main entry point
//!
//! This is the command-line interface for the Deadlink-Sweep dead link finder.

use anyhow::Context;
use clap::Parser;
use deadlink_sweep::config::{load_config_with_hash, parse_duration, validate, Config};
use deadlink_sweep::output::ProgressCallback;
use deadlink_sweep::{write_report, Progress};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Deadlink-Sweep: find broken links on a website
///
/// Crawls same-host pages from a start URL up to a bounded depth and page
/// count, checks every discovered link, and prints the dead ones together with
/// the pages that link to them.
#[derive(Parser, Debug)]
#[command(name = "deadlink-sweep")]
#[command(version)]
#[command(about = "Find dead links on a website", long_about = None)]
struct Cli {
    /// Start URL to crawl from
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Optional TOML configuration file; flags override its values
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Per-request timeout (e.g. 10s, 500ms)
    #[arg(long, value_parser = duration_arg)]
    timeout: Option<Duration>,

    /// Try HEAD before GET [default: true]
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    head_first: Option<bool>,

    /// Number of concurrent link checks [default: 20]
    #[arg(long)]
    concurrency: Option<usize>,

    /// Maximum crawl depth; 0 fetches only the start page [default: 2]
    #[arg(long)]
    max_depth: Option<u32>,

    /// Maximum number of pages fetched [default: 200]
    #[arg(long)]
    max_pages: Option<usize>,

    /// Also check links on other hosts [default: false]
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    allow_external: Option<bool>,

    /// Check img/script/link targets [default: true]
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    check_assets: Option<bool>,

    /// Global request rate, per second [default: 10]
    #[arg(long)]
    rate: Option<usize>,

    /// Per-host request rate, per second [default: 2]
    #[arg(long)]
    per_host_rate: Option<usize>,

    /// Minimum interval between progress lines [default: 1s]
    #[arg(long, value_parser = duration_arg)]
    progress_every: Option<Duration>,

    /// Validate the configuration and print it without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Layers the flags that were given on top of `config`
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.crawl.start_url = Some(url.clone());
        }
        if let Some(timeout) = self.timeout {
            config.http.timeout = timeout;
        }
        if let Some(head_first) = self.head_first {
            config.check.head_first = head_first;
        }
        if let Some(concurrency) = self.concurrency {
            config.check.concurrency = concurrency;
        }
        if let Some(max_depth) = self.max_depth {
            config.crawl.max_depth = max_depth;
        }
        if let Some(max_pages) = self.max_pages {
            config.crawl.max_pages = max_pages;
        }
        if let Some(allow_external) = self.allow_external {
            config.check.allow_external = allow_external;
        }
        if let Some(check_assets) = self.check_assets {
            config.crawl.check_assets = check_assets;
        }
        if let Some(rate) = self.rate {
            config.rate.global = rate;
        }
        if let Some(per_host) = self.per_host_rate {
            config.rate.per_host = per_host;
        }
        if let Some(every) = self.progress_every {
            config.output.progress_every = every;
        }
    }
}

fn duration_arg(raw: &str) -> Result<Duration, String> {
    parse_duration(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Run failed: {:?}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("loading {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };
    cli.apply(&mut config);
    validate(&config)?;

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            interrupt.cancel();
        }
    });

    let progress: ProgressCallback = Arc::new(|progress: &Progress| tracing::info!("{}", progress));
    let report = deadlink_sweep::run(&config, &cancel, Some(progress)).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &report)?;
    out.flush()?;
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so the report on stdout stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("deadlink_sweep=info,warn"),
            1 => EnvFilter::new("deadlink_sweep=debug,info"),
            2 => EnvFilter::new("deadlink_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Deadlink-Sweep Dry Run ===\n");

    println!("Crawl:");
    println!(
        "  Start URL: {}",
        config.crawl.start_url.as_deref().unwrap_or("(none)")
    );
    println!("  Max depth: {}", config.crawl.max_depth);
    println!("  Max pages: {}", config.crawl.max_pages);
    println!("  Check assets: {}", config.crawl.check_assets);

    println!("\nCheck:");
    println!("  Concurrency: {}", config.check.concurrency);
    println!("  HEAD first: {}", config.check.head_first);
    println!("  Allow external: {}", config.check.allow_external);

    println!("\nRate limits:");
    println!("  Global: {}/s", config.rate.global);
    println!("  Per host: {}/s", config.rate.per_host);

    println!("\nHTTP:");
    println!("  Timeout: {:?}", config.http.timeout);
    println!("  User-Agent: {}", config.http.user_agent);

    println!("\nDry run complete. No requests were made.");
    Ok(())
}
