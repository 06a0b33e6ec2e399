//! Sitemap document handling
//!
//! This module turns raw sitemap bytes into something the crawler can act on:
//! - Building an element tree from XML (namespace prefixes stripped)
//! - Classifying the tree as a `urlset` or a `sitemapindex`
//! - Projecting `<url>` entries into [`SiteEntry`] values

mod document;
mod fields;

pub use document::{parse_document, DocumentError, Element, ParseOptions};
pub use fields::{FieldSelection, SiteEntry, SiteField};

/// The shape of a parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// A `urlset` with its `<url>` entries
    Urlset(Vec<Element>),

    /// A `sitemapindex` with the `loc` of every child sitemap
    Index(Vec<String>),

    /// Anything else, including an empty `urlset` or `sitemapindex`
    Unknown,
}

impl SitemapDocument {
    /// Classifies a document by its root element
    ///
    /// A `urlset` needs at least one `url` child and a `sitemapindex` at
    /// least one `sitemap` child; child sitemaps without a `loc` are skipped.
    ///
    /// # Example
    ///
    /// ```
    /// use sitemap_ripple::sitemap::{parse_document, ParseOptions, SitemapDocument};
    ///
    /// let xml = b"<sitemapindex><sitemap><loc>https://example.com/a.xml</loc></sitemap></sitemapindex>";
    /// let root = parse_document(xml, ParseOptions::default()).unwrap();
    /// assert_eq!(
    ///     SitemapDocument::classify(root),
    ///     SitemapDocument::Index(vec!["https://example.com/a.xml".to_string()])
    /// );
    /// ```
    pub fn classify(root: Element) -> Self {
        match root.name.as_str() {
            "urlset" if root.child("url").is_some() => Self::Urlset(
                root.children
                    .into_iter()
                    .filter(|child| child.name == "url")
                    .collect(),
            ),
            "sitemapindex" if root.child("sitemap").is_some() => Self::Index(
                root.children_named("sitemap")
                    .filter_map(|sitemap| sitemap.child_text("loc"))
                    .map(str::to_string)
                    .collect(),
            ),
            _ => Self::Unknown,
        }
    }
}
