//! Public entry point of a crawl

use crate::cancel::CancellationSignal;
use crate::config::{validate, validate_sitemap_url, Config};
use crate::crawler::deadline::Deadlines;
use crate::crawler::engine::CrawlEngine;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::types::{ErrorRecord, FailureKind, FetchOptions, FetchResult};
use crate::filter::SiteFilter;
use crate::{ConfigError, Result, SitemapError};
use std::time::Instant;

/// A configured sitemap crawler
///
/// The configuration is validated once at construction and never changes
/// afterwards. A `Sitemapper` can run any number of crawls, sequentially or
/// concurrently.
///
/// # Example
///
/// ```no_run
/// use sitemap_ripple::{Config, FetchOptions, Sitemapper};
///
/// # async fn run() -> sitemap_ripple::Result<()> {
/// let sitemapper = Sitemapper::new(Config::new("https://example.com/sitemap.xml"))?;
/// let result = sitemapper.fetch(FetchOptions::default()).await?;
///
/// for site in &result.sites {
///     println!("{}", site.loc());
/// }
/// for error in &result.errors {
///     eprintln!("{}: {}", error.url, error.message);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Sitemapper {
    config: Config,
    engine: CrawlEngine,
    signal: Option<CancellationSignal>,
}

impl Sitemapper {
    /// Creates a crawler from a configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Sitemapper)` - The configuration is valid and the client was built
    /// * `Err(SitemapError::Config)` - The configuration is invalid
    /// * `Err(SitemapError::Client)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;

        let client = build_http_client(&config.request)?;
        let engine = CrawlEngine::new(
            client,
            Deadlines::new(config.crawler.timeout_duration()),
            SiteFilter::from_config(&config)?,
            config.output.fields.clone(),
            config.crawler.concurrency,
            config.crawler.retries,
        );

        Ok(Self {
            config,
            engine,
            signal: None,
        })
    }

    /// Sets the signal used by calls that do not bring their own
    pub fn with_signal(mut self, signal: CancellationSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// The configuration this crawler was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of deadline guards currently armed
    pub fn active_deadlines(&self) -> usize {
        self.engine.deadlines().active()
    }

    /// Crawls a sitemap tree
    ///
    /// The URL and signal in `options` take precedence over the configured
    /// ones. Failing sitemaps do not fail the call: they are reported in
    /// [`FetchResult::errors`] next to whatever sites were found. A missing
    /// or unusable URL is reported the same way, as a single
    /// [`FailureKind::Request`] record.
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResult)` - The crawl finished, possibly with errors
    /// * `Err(SitemapError::Aborted)` - The signal was triggered, before or
    ///   during the crawl
    pub async fn fetch(&self, options: FetchOptions) -> Result<FetchResult> {
        let signal = options
            .signal
            .or_else(|| self.signal.clone())
            .unwrap_or_else(CancellationSignal::never);

        if signal.is_cancelled() {
            return Err(SitemapError::Aborted);
        }

        let url = options.url.or_else(|| self.config.url.clone());
        let checked = match &url {
            Some(url) => validate_sitemap_url(url),
            None => Err(ConfigError::Validation("no sitemap URL given".to_string())),
        };
        let url = url.unwrap_or_default();
        if let Err(e) = checked {
            tracing::warn!("Not crawling '{}': {}", url, e);
            return Ok(FetchResult {
                errors: vec![ErrorRecord {
                    kind: FailureKind::Request,
                    message: e.to_string(),
                    url: url.clone(),
                    retries: 0,
                }],
                url,
                sites: Vec::new(),
            });
        }

        tracing::info!("Crawling sitemap tree at {}", url);
        let started = Instant::now();

        let result = match self.engine.crawl(url.clone(), signal).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Crawl of {} aborted after {:?}", url, started.elapsed());
                return Err(e);
            }
        };

        tracing::info!(
            "Crawl of {} finished in {:?}: {} sites, {} failed sitemaps",
            url,
            started.elapsed(),
            result.sites.len(),
            result.errors.len()
        );

        Ok(FetchResult {
            url,
            sites: result.sites,
            errors: result.errors,
        })
    }
}
