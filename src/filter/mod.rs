//! Filtering of discovered URLs
//!
//! This module provides the two pure filters applied while crawling:
//! - Exclusion patterns, applied to page URLs and child sitemap URLs
//! - The `lastmod` floor, applied to page entries only

mod exclusion;
mod lastmod;

pub use exclusion::ExclusionFilter;
pub use lastmod::{parse_lastmod, passes_lastmod};

use crate::config::Config;
use crate::ConfigError;

/// The complete per-run filter for page entries
#[derive(Debug, Clone, Default)]
pub struct SiteFilter {
    /// Minimum `lastmod` in epoch milliseconds, `0` disables
    pub min_last_modified: i64,

    /// Compiled exclusion patterns
    pub exclusions: ExclusionFilter,
}

impl SiteFilter {
    /// Builds the filter described by a configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            min_last_modified: config.crawler.lastmod,
            exclusions: ExclusionFilter::new(&config.filter.exclusions)?,
        })
    }

    /// Returns true if a page entry should be reported
    ///
    /// The `lastmod` floor is checked first, then the exclusion patterns.
    pub fn accepts(&self, loc: &str, lastmod: Option<&str>) -> bool {
        passes_lastmod(lastmod, self.min_last_modified) && !self.exclusions.is_excluded(loc)
    }

    /// Returns true if a URL matches an exclusion pattern
    pub fn is_excluded(&self, url: &str) -> bool {
        self.exclusions.is_excluded(url)
    }
}
