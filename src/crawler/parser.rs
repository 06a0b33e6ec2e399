//! Sitemap node parsing
//!
//! Fetches one sitemap under its deadline and classifies it as a page list,
//! an index of child sitemaps, or a failure.

use crate::cancel::CancellationSignal;
use crate::crawler::deadline::DeadlineGuard;
use crate::crawler::fetcher::{decode_body, download, Download};
use crate::crawler::types::FailureKind;
use crate::sitemap::{parse_document, Element, ParseOptions, SitemapDocument};
use crate::SitemapError;
use reqwest::Client;
use thiserror::Error;

/// Outcome of fetching and classifying one sitemap
#[derive(Debug)]
pub enum NodeOutcome {
    /// A `urlset`: the raw `<url>` entries
    Leaf(Vec<Element>),

    /// A `sitemapindex`: child sitemap URLs in document order
    ChildIndex(Vec<String>),

    /// A retryable failure
    Failed(NodeFailure),
}

/// Why a single sitemap could not be used
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NodeFailure {
    #[error("Request timed out after {timeout_ms}ms: {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Failed to parse {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Unknown sitemap state for {url}")]
    UnknownState { url: String },

    #[error("Failed to decompress {url}: {message}")]
    Decompress { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },
}

impl NodeFailure {
    /// Category recorded in the error list
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Http { .. } => FailureKind::Http,
            Self::Parse { .. } => FailureKind::Parse,
            Self::UnknownState { .. } => FailureKind::UnknownState,
            Self::Decompress { .. } => FailureKind::Decompress,
            Self::Request { .. } => FailureKind::Request,
        }
    }

    fn from_transport(url: &str, error: reqwest::Error, guard: &DeadlineGuard) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                timeout_ms: guard.timeout().as_millis() as u64,
            }
        } else if let Some(status) = error.status() {
            Self::Http {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Fetches and classifies one sitemap
///
/// The download races the guard: if the guard fires first the request is
/// dropped, which cancels it. A guard whose own timer ran out yields
/// [`NodeFailure::Timeout`]; any other firing, and any cancellation of the
/// run observed on the way, yields [`SitemapError::Aborted`].
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The sitemap URL
/// * `guard` - The deadline armed for this fetch
/// * `signal` - The run's cancellation signal
///
/// # Returns
///
/// * `Ok(NodeOutcome)` - The classified sitemap, or a retryable failure
/// * `Err(SitemapError::Aborted)` - The run was cancelled
pub(crate) async fn parse_node(
    client: &Client,
    url: &str,
    guard: &DeadlineGuard,
    signal: &CancellationSignal,
) -> Result<NodeOutcome, SitemapError> {
    let downloaded = tokio::select! {
        biased;
        _ = guard.fired() => None,
        result = download(client, url) => Some(result),
    };

    if signal.is_cancelled() {
        return Err(SitemapError::Aborted);
    }

    let body = match downloaded {
        None if !guard.timed_out() => return Err(SitemapError::Aborted),
        None => {
            return Ok(NodeOutcome::Failed(NodeFailure::Timeout {
                url: url.to_string(),
                timeout_ms: guard.timeout().as_millis() as u64,
            }))
        }
        Some(Err(e)) => {
            return Ok(NodeOutcome::Failed(NodeFailure::from_transport(url, e, guard)));
        }
        Some(Ok(Download::Status(status))) => {
            return Ok(NodeOutcome::Failed(NodeFailure::Http {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }
        Some(Ok(Download::Body(body))) => body,
    };

    Ok(classify_body(url, &body))
}

/// Decompresses, parses and classifies a downloaded sitemap body
pub fn classify_body(url: &str, body: &[u8]) -> NodeOutcome {
    let decoded = match decode_body(body) {
        Ok(decoded) => decoded,
        Err(e) => {
            return NodeOutcome::Failed(NodeFailure::Decompress {
                url: url.to_string(),
                message: e.to_string(),
            })
        }
    };

    let root = match parse_document(&decoded, ParseOptions::default()) {
        Ok(root) => root,
        Err(e) => {
            return NodeOutcome::Failed(NodeFailure::Parse {
                url: url.to_string(),
                message: e.to_string(),
            })
        }
    };

    match SitemapDocument::classify(root) {
        SitemapDocument::Urlset(entries) => NodeOutcome::Leaf(entries),
        SitemapDocument::Index(children) => NodeOutcome::ChildIndex(children),
        SitemapDocument::Unknown => NodeOutcome::Failed(NodeFailure::UnknownState {
            url: url.to_string(),
        }),
    }
}
