//! Statistics of a finished crawl
//!
//! This module summarizes a [`FetchResult`] for display after a run.

use crate::crawler::{FailureKind, FetchResult};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    /// Root sitemap URL
    pub url: String,

    /// Number of sites reported
    pub sites: u64,

    /// Number of sitemaps that failed permanently
    pub failed_sitemaps: u64,

    /// Failed sitemaps by failure kind
    pub errors_by_kind: BTreeMap<FailureKind, u64>,

    /// Sitemaps that needed at least one retry before failing
    pub retried_sitemaps: u64,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Collects statistics from a finished crawl
    ///
    /// # Arguments
    ///
    /// * `result` - The crawl result
    /// * `elapsed` - How long the crawl took
    pub fn from_result(result: &FetchResult, elapsed: Duration) -> Self {
        let mut errors_by_kind = BTreeMap::new();
        for error in &result.errors {
            *errors_by_kind.entry(error.kind).or_insert(0) += 1;
        }

        Self {
            url: result.url.clone(),
            sites: result.sites.len() as u64,
            failed_sitemaps: result.errors.len() as u64,
            errors_by_kind,
            retried_sitemaps: result.errors.iter().filter(|e| e.retries > 0).count() as u64,
            elapsed,
        }
    }
}

/// Formats statistics as a human-readable report
pub fn format_statistics(stats: &CrawlStatistics) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Crawl Statistics ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Root sitemap: {}", stats.url);
    let _ = writeln!(out, "  Sites found: {}", stats.sites);
    let _ = writeln!(out, "  Failed sitemaps: {}", stats.failed_sitemaps);
    let _ = writeln!(out, "  Elapsed: {:.2}s", stats.elapsed.as_secs_f64());

    if !stats.errors_by_kind.is_empty() {
        let _ = writeln!(out, "\nError Summary:");
        let mut error_counts: Vec<_> = stats.errors_by_kind.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in error_counts {
            let _ = writeln!(out, "  {}: {}", kind, count);
        }
        if stats.retried_sitemaps > 0 {
            let _ = writeln!(out, "  ({} failed after retrying)", stats.retried_sitemaps);
        }
    }

    out
}

/// Prints statistics to stderr, keeping stdout for the site list
pub fn print_statistics(stats: &CrawlStatistics) {
    eprint!("{}", format_statistics(stats));
}
