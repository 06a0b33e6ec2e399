use crate::sitemap::FieldSelection;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Sitemap-Ripple
///
/// Every section is optional; missing values take the documented defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Default sitemap URL to crawl
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub request: RequestConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Creates a default configuration crawling the given sitemap URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Per-request deadline (milliseconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Maximum concurrent child fetches per sitemap index
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Retries per failed sitemap before it is reported as an error
    #[serde(default)]
    pub retries: u32,

    /// Minimum `lastmod` of reported pages (epoch milliseconds, 0 = off)
    #[serde(default)]
    pub lastmod: i64,
}

impl CrawlerConfig {
    /// Per-request deadline as a [`Duration`]
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            concurrency: default_concurrency(),
            retries: 0,
            lastmod: 0,
        }
    }
}

fn default_timeout() -> u64 {
    15_000
}

fn default_concurrency() -> usize {
    10
}

/// Transport configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestConfig {
    /// Accept invalid TLS certificates (rejected by default)
    #[serde(rename = "accept-invalid-certs", default)]
    pub accept_invalid_certs: bool,

    /// Proxy URL applied to every request
    #[serde(default)]
    pub proxy: Option<String>,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// URL filtering configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Regular expressions; matching page and sitemap URLs are skipped
    #[serde(default)]
    pub exclusions: Vec<String>,
}

/// Result shape configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Bare URLs (`false`) or a table of fields to report per page
    #[serde(default)]
    pub fields: FieldSelection,
}
