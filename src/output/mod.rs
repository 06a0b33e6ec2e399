//! Output module for rendering crawl results
//!
//! This module handles:
//! - Rendering discovered sites as plain text or JSON
//! - Recording crawl statistics

pub mod stats;

pub use stats::{format_statistics, print_statistics, CrawlStatistics};

use crate::crawler::FetchResult;
use crate::sitemap::{SiteEntry, SiteField};

/// How a crawl result is written to stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One site per line; selected fields follow the URL, tab-separated
    #[default]
    Text,

    /// The whole result, including errors, as pretty-printed JSON
    Json,
}

/// Renders a crawl result
///
/// In text mode only sites are rendered; errors are left to the caller.
pub fn render(result: &FetchResult, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result),
        OutputFormat::Text => Ok(result
            .sites
            .iter()
            .map(render_site)
            .map(|line| line + "\n")
            .collect()),
    }
}

fn render_site(site: &SiteEntry) -> String {
    match site {
        SiteEntry::Url(url) => url.clone(),
        SiteEntry::Fields(fields) => {
            let mut line = site.loc().to_string();
            for (field, value) in fields.iter().filter(|(field, _)| **field != SiteField::Loc) {
                line.push('\t');
                line.push_str(field.name());
                line.push('=');
                line.push_str(value);
            }
            line
        }
    }
}
