//! Sitemap-Ripple: a recursive sitemap crawler
//!
//! This crate walks a sitemap tree (a `urlset` listing pages, or a
//! `sitemapindex` referencing child sitemaps to any depth), bounding fan-out
//! per index node, racing every fetch against a deadline, retrying failed
//! nodes and folding per-node outcomes into one flat list of sites and errors.

pub mod cancel;
pub mod config;
pub mod crawler;
pub mod filter;
pub mod output;
pub mod sitemap;

use thiserror::Error;

/// Main error type for Sitemap-Ripple operations
///
/// Per-node crawl failures never surface here: they are absorbed into the
/// `errors` list of a [`FetchResult`]. Only cancellation unwinds a crawl.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Crawl aborted")]
    Aborted,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl SitemapError {
    /// Returns true if this error is the result of a triggered cancellation
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid exclusion pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),
}

/// Result type alias for Sitemap-Ripple operations
pub type Result<T> = std::result::Result<T, SitemapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cancel::{CancellationSignal, CancellationSource};
pub use config::Config;
pub use crawler::{CrawlResult, ErrorRecord, FailureKind, FetchOptions, FetchResult, Sitemapper};
pub use sitemap::{FieldSelection, SiteEntry, SiteField};
