use crate::cancel::CancellationSignal;
use crate::sitemap::SiteEntry;
use serde::Serialize;
use std::fmt;

/// Category of a permanent sitemap failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FailureKind {
    /// The deadline fired before the sitemap was downloaded
    #[serde(rename = "TimeoutError")]
    Timeout,

    /// Non-success status code or HTTP-level failure
    #[serde(rename = "HTTPError")]
    Http,

    /// The body was not well-formed XML
    #[serde(rename = "ParseError")]
    Parse,

    /// The document was neither a `urlset` nor a `sitemapindex`
    #[serde(rename = "UnknownState")]
    UnknownState,

    /// The body looked gzip-compressed but did not inflate
    #[serde(rename = "DecompressError")]
    Decompress,

    /// Connection, TLS, redirect or other transport failure
    #[serde(rename = "RequestError")]
    Request,
}

impl FailureKind {
    /// Returns the stable label used in error records
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "TimeoutError",
            Self::Http => "HTTPError",
            Self::Parse => "ParseError",
            Self::UnknownState => "UnknownState",
            Self::Decompress => "DecompressError",
            Self::Request => "RequestError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sitemap that failed permanently, after exhausting its retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub kind: FailureKind,
    pub message: String,
    /// URL of the failed sitemap
    pub url: String,
    /// Number of retries attempted before giving up
    pub retries: u32,
}

/// Outcome of crawling one sitemap subtree
///
/// A single sitemap yields either sites and no errors, or no sites and
/// exactly one error. Index nodes merge the outcomes of their children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    pub sites: Vec<SiteEntry>,
    pub errors: Vec<ErrorRecord>,
}

impl CrawlResult {
    /// A successful outcome holding the given sites
    pub fn sites(sites: Vec<SiteEntry>) -> Self {
        Self {
            sites,
            errors: Vec::new(),
        }
    }

    /// A failed outcome holding a single error record
    pub fn failure(error: ErrorRecord) -> Self {
        Self {
            sites: Vec::new(),
            errors: vec![error],
        }
    }

    /// Returns true if no error was recorded
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Final result of a crawl, returned to the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchResult {
    /// The sitemap URL the crawl started from
    pub url: String,
    pub sites: Vec<SiteEntry>,
    /// Sitemaps that failed; non-empty means the result is partial
    pub errors: Vec<ErrorRecord>,
}

/// Per-call overrides for [`Sitemapper::fetch`](crate::Sitemapper::fetch)
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Sitemap to crawl instead of the configured `url`
    pub url: Option<String>,

    /// Cancellation signal taking precedence over the crawler's own
    pub signal: Option<CancellationSignal>,
}

impl FetchOptions {
    /// Options crawling the given URL
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            signal: None,
        }
    }

    /// Attaches a cancellation signal
    pub fn with_signal(mut self, signal: CancellationSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}
