use crate::ConfigError;
use regex::Regex;

/// An ordered set of exclusion patterns matched against sitemap URLs
///
/// Patterns are regular expressions searched anywhere in the URL, so
/// `\.pdf$` excludes PDF links and `/private/` excludes a whole path segment.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    patterns: Vec<Regex>,
}

impl ExclusionFilter {
    /// Compiles the given patterns, keeping their order
    ///
    /// # Arguments
    ///
    /// * `patterns` - Regular expressions to exclude
    ///
    /// # Returns
    ///
    /// * `Ok(ExclusionFilter)` - All patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - The first pattern that failed
    ///
    /// # Examples
    ///
    /// ```
    /// use sitemap_ripple::filter::ExclusionFilter;
    ///
    /// let filter = ExclusionFilter::new(&[r"\.pdf$", "/private/"]).unwrap();
    /// assert!(filter.is_excluded("https://example.com/report.pdf"));
    /// assert!(filter.is_excluded("https://example.com/private/page"));
    /// assert!(!filter.is_excluded("https://example.com/public/page"));
    /// ```
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|e| {
                    ConfigError::InvalidPattern(format!("'{}': {}", pattern, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if the URL matches any exclusion pattern
    pub fn is_excluded(&self, url: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(url))
    }

    /// Number of configured patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no pattern is configured
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
