//! Recursive crawl engine
//!
//! Walks one sitemap subtree: fetches the node, retries it on failure, and
//! either projects its pages or fans out over its children.

use crate::cancel::CancellationSignal;
use crate::crawler::aggregate::aggregate;
use crate::crawler::deadline::Deadlines;
use crate::crawler::limiter::FanOutLimiter;
use crate::crawler::parser::{parse_node, NodeFailure, NodeOutcome};
use crate::crawler::types::{CrawlResult, ErrorRecord};
use crate::filter::SiteFilter;
use crate::sitemap::{Element, FieldSelection, SiteEntry};
use crate::SitemapError;
use futures::future::{try_join_all, BoxFuture, FutureExt};
use reqwest::Client;

/// Shared state of one crawl, borrowed by every recursion frame
#[derive(Debug)]
pub struct CrawlEngine {
    client: Client,
    deadlines: Deadlines,
    filter: SiteFilter,
    fields: FieldSelection,
    concurrency: usize,
    retries: u32,
}

impl CrawlEngine {
    pub fn new(
        client: Client,
        deadlines: Deadlines,
        filter: SiteFilter,
        fields: FieldSelection,
        concurrency: usize,
        retries: u32,
    ) -> Self {
        Self {
            client,
            deadlines,
            filter,
            fields,
            concurrency,
            retries,
        }
    }

    /// Deadline registry shared by every fetch of this engine
    pub fn deadlines(&self) -> &Deadlines {
        &self.deadlines
    }

    /// Crawls the subtree rooted at `url`
    ///
    /// Node failures are retried immediately up to the configured maximum and
    /// then recorded as a single [`ErrorRecord`]. The returned future only
    /// fails with [`SitemapError::Aborted`].
    pub fn crawl<'a>(
        &'a self,
        url: String,
        signal: CancellationSignal,
    ) -> BoxFuture<'a, Result<CrawlResult, SitemapError>> {
        async move {
            let mut attempt: u32 = 0;

            loop {
                if signal.is_cancelled() {
                    return Err(SitemapError::Aborted);
                }

                tracing::debug!("Fetching sitemap {} (attempt {})", url, attempt + 1);
                let guard = self.deadlines.arm(&url, &signal);
                let outcome = parse_node(&self.client, &url, &guard, &signal).await;
                guard.clear();

                match outcome? {
                    NodeOutcome::Leaf(entries) => {
                        let sites = project_sites(&entries, &url, &self.filter, &self.fields);
                        tracing::info!(
                            "Sitemap {} listed {} pages, kept {}",
                            url,
                            entries.len(),
                            sites.len()
                        );
                        return Ok(CrawlResult::sites(sites));
                    }
                    NodeOutcome::ChildIndex(children) => {
                        tracing::info!("Sitemap index {} references {} sitemaps", url, children.len());
                        return self.crawl_children(children, signal).await;
                    }
                    NodeOutcome::Failed(failure) if attempt < self.retries => {
                        attempt += 1;
                        tracing::warn!(
                            "{} (retry {}/{})",
                            failure,
                            attempt,
                            self.retries
                        );
                    }
                    NodeOutcome::Failed(failure) => {
                        tracing::warn!("Giving up on {}: {}", url, failure);
                        return Ok(CrawlResult::failure(error_record(&url, failure, attempt)));
                    }
                }
            }
        }
        .boxed()
    }

    /// Crawls the children of an index, at most `concurrency` at a time
    async fn crawl_children(
        &self,
        children: Vec<String>,
        signal: CancellationSignal,
    ) -> Result<CrawlResult, SitemapError> {
        if signal.is_cancelled() {
            return Err(SitemapError::Aborted);
        }

        let limiter = FanOutLimiter::new(self.concurrency);
        let crawls = children
            .into_iter()
            .filter(|child| {
                let excluded = self.filter.is_excluded(child);
                if excluded {
                    tracing::debug!("Excluded sitemap {}", child);
                }
                !excluded
            })
            .map(|child| limiter.run(self.crawl(child, signal.clone())));

        // Stops at the first abort, dropping every sibling still pending
        let results = try_join_all(crawls).await?;
        tracing::debug!(
            "Settled {} child sitemaps, at most {} in flight",
            results.len(),
            limiter.peak()
        );
        Ok(aggregate(results))
    }
}

fn error_record(url: &str, failure: NodeFailure, retries: u32) -> ErrorRecord {
    ErrorRecord {
        kind: failure.kind(),
        message: failure.to_string(),
        url: url.to_string(),
        retries,
    }
}

/// Turns the `<url>` entries of a urlset into reported sites
///
/// Entries are dropped when they fail the `lastmod` floor, match an exclusion
/// pattern, or carry no `loc`. Document order is kept.
pub fn project_sites(
    entries: &[Element],
    sitemap_url: &str,
    filter: &SiteFilter,
    fields: &FieldSelection,
) -> Vec<SiteEntry> {
    entries
        .iter()
        .filter_map(|entry| {
            let Some(loc) = entry.child_text("loc") else {
                tracing::debug!("Skipping entry without loc in {}", sitemap_url);
                return None;
            };
            if !filter.accepts(loc, entry.child_text("lastmod")) {
                return None;
            }
            fields.project(entry, sitemap_url)
        })
        .collect()
}
