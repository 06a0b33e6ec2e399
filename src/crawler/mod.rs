//! Crawler module for sitemap trees
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with gzip sniffing
//! - Per-request deadlines tied to the run's cancellation signal
//! - Per-index fan-out limiting
//! - Recursive crawling with retries and result aggregation

mod aggregate;
mod deadline;
mod engine;
mod fetcher;
mod limiter;
mod parser;
mod sitemapper;
mod types;

pub use aggregate::aggregate;
pub use deadline::Deadlines;
pub use engine::{project_sites, CrawlEngine};
pub use fetcher::{build_http_client, decode_body, download, is_gzip, Download};
pub use parser::{classify_body, NodeFailure, NodeOutcome};
pub use sitemapper::Sitemapper;
pub use types::{CrawlResult, ErrorRecord, FailureKind, FetchOptions, FetchResult};
