//! Sitemap-Ripple main entry point
//!
//! This is the command-line interface for the Sitemap-Ripple crawler.

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use sitemap_ripple::config::{load_config_with_hash, Config};
use sitemap_ripple::output::{print_statistics, render, CrawlStatistics, OutputFormat};
use sitemap_ripple::{CancellationSource, FetchOptions, FieldSelection, SiteField, Sitemapper};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Sitemap-Ripple: a recursive sitemap crawler
///
/// Sitemap-Ripple walks a sitemap or sitemap index to any depth and prints
/// every page URL it lists. Sitemaps that fail are reported on stderr and
/// do not stop the crawl.
#[derive(Parser, Debug)]
#[command(name = "sitemap-ripple")]
#[command(version)]
#[command(about = "A recursive sitemap crawler", long_about = None)]
struct Cli {
    /// Sitemap URL (overrides `url` from the config file)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Maximum concurrent child sitemaps per index
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Retries per failing sitemap
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Drop pages last modified before this epoch timestamp (ms)
    #[arg(long, value_name = "MS")]
    lastmod: Option<i64>,

    /// Exclude URLs matching this regex (repeatable)
    #[arg(long = "exclude", value_name = "REGEX")]
    exclusions: Vec<String>,

    /// Report this field next to each URL (repeatable)
    #[arg(long = "field", value_name = "NAME")]
    fields: Vec<SiteField>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Route requests through this proxy
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Extra request header, as "Name: value" (repeatable)
    #[arg(long = "header", value_name = "HEADER")]
    headers: Vec<String>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Print crawl statistics to stderr when done
    #[arg(long)]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_ripple=info,warn"),
            1 => EnvFilter::new("sitemap_ripple=debug,info"),
            2 => EnvFilter::new("sitemap_ripple=trace,debug"),
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

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = build_config(&cli)?;
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let source = CancellationSource::new();
    let sitemapper = Sitemapper::new(config)
        .context("Invalid configuration")?
        .with_signal(source.signal());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling crawl");
            source.cancel();
        }
    });

    let started = Instant::now();
    let result = match sitemapper.fetch(FetchOptions::default()).await {
        Ok(result) => result,
        Err(e) if e.is_aborted() => {
            tracing::error!("Crawl aborted");
            return Ok(ExitCode::from(130));
        }
        Err(e) => return Err(e).context("Crawl failed"),
    };
    let elapsed = started.elapsed();

    print!("{}", render(&result, format).context("Failed to render result")?);

    if format == OutputFormat::Text {
        for error in &result.errors {
            tracing::warn!("[{}] {} (retries: {})", error.kind, error.message, error.retries);
        }
    }

    if cli.stats {
        print_statistics(&CrawlStatistics::from_result(&result, elapsed));
    }

    Ok(ExitCode::SUCCESS)
}

/// Loads the config file, if any, and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(url) = &cli.url {
        config.url = Some(url.clone());
    }
    if config.url.is_none() {
        bail!("No sitemap URL given; pass one or set `url` in the config file");
    }

    if let Some(timeout) = cli.timeout {
        config.crawler.timeout = timeout;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(retries) = cli.retries {
        config.crawler.retries = retries;
    }
    if let Some(lastmod) = cli.lastmod {
        config.crawler.lastmod = lastmod;
    }

    config.filter.exclusions.extend(cli.exclusions.iter().cloned());

    if !cli.fields.is_empty() {
        let mut fields = match &config.output.fields {
            FieldSelection::Fields(fields) => fields.clone(),
            FieldSelection::UrlOnly => Default::default(),
        };
        fields.extend(cli.fields.iter().copied());
        config.output.fields = FieldSelection::Fields(fields);
    }

    if cli.insecure {
        config.request.accept_invalid_certs = true;
    }
    if let Some(proxy) = &cli.proxy {
        config.request.proxy = Some(proxy.clone());
    }
    for header in &cli.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| anyhow!("Header '{}' must look like 'Name: value'", header))?;
        config
            .request
            .headers
            .insert(name.trim().to_string(), value.trim().to_string());
    }

    Ok(config)
}
