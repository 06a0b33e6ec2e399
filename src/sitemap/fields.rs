//! Site entry projection
//!
//! Callers either want bare page URLs or a mapping of selected fields per
//! page. The set of fields is closed: each [`SiteField`] knows its
//! configuration name and how to pull its value out of a `<url>` element.

use crate::sitemap::Element;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// A field that can be projected from a sitemap `<url>` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SiteField {
    #[serde(rename = "loc")]
    Loc,
    #[serde(rename = "lastmod")]
    Lastmod,
    #[serde(rename = "changefreq")]
    Changefreq,
    #[serde(rename = "priority")]
    Priority,
    /// URL of the sitemap document the entry was listed in
    #[serde(rename = "sitemap")]
    Sitemap,
    #[serde(rename = "image:loc")]
    ImageLoc,
    #[serde(rename = "image:title")]
    ImageTitle,
    #[serde(rename = "image:caption")]
    ImageCaption,
    #[serde(rename = "video:title")]
    VideoTitle,
    #[serde(rename = "video:description")]
    VideoDescription,
    #[serde(rename = "video:thumbnail_loc")]
    VideoThumbnailLoc,
}

impl SiteField {
    /// Every supported field, in projection order
    pub const ALL: [SiteField; 11] = [
        SiteField::Loc,
        SiteField::Lastmod,
        SiteField::Changefreq,
        SiteField::Priority,
        SiteField::Sitemap,
        SiteField::ImageLoc,
        SiteField::ImageTitle,
        SiteField::ImageCaption,
        SiteField::VideoTitle,
        SiteField::VideoDescription,
        SiteField::VideoThumbnailLoc,
    ];

    /// Returns the configuration name of this field
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loc => "loc",
            Self::Lastmod => "lastmod",
            Self::Changefreq => "changefreq",
            Self::Priority => "priority",
            Self::Sitemap => "sitemap",
            Self::ImageLoc => "image:loc",
            Self::ImageTitle => "image:title",
            Self::ImageCaption => "image:caption",
            Self::VideoTitle => "video:title",
            Self::VideoDescription => "video:description",
            Self::VideoThumbnailLoc => "video:thumbnail_loc",
        }
    }

    /// Looks a field up by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Extracts this field's value from a `<url>` element
    ///
    /// # Arguments
    ///
    /// * `entry` - The `<url>` element
    /// * `sitemap_url` - URL of the document that listed the entry
    ///
    /// # Returns
    ///
    /// The trimmed value, or `None` if the entry does not carry this field
    pub fn extract(&self, entry: &Element, sitemap_url: &str) -> Option<String> {
        let value = match self {
            Self::Loc => entry.child_text("loc"),
            Self::Lastmod => entry.child_text("lastmod"),
            Self::Changefreq => entry.child_text("changefreq"),
            Self::Priority => entry.child_text("priority"),
            Self::Sitemap => Some(sitemap_url),
            Self::ImageLoc => nested_text(entry, "image", "loc"),
            Self::ImageTitle => nested_text(entry, "image", "title"),
            Self::ImageCaption => nested_text(entry, "image", "caption"),
            Self::VideoTitle => nested_text(entry, "video", "title"),
            Self::VideoDescription => nested_text(entry, "video", "description"),
            Self::VideoThumbnailLoc => nested_text(entry, "video", "thumbnail_loc"),
        };
        value.map(str::to_string)
    }
}

fn nested_text<'a>(entry: &'a Element, parent: &str, name: &str) -> Option<&'a str> {
    entry.child(parent).and_then(|element| element.child_text(name))
}

impl fmt::Display for SiteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SiteField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(SiteField::name).collect();
            format!("unknown field '{}' (expected one of: {})", s, known.join(", "))
        })
    }
}

/// Which values a crawl reports per page
///
/// In configuration files this is either `fields = false` (bare URLs) or a
/// table of field names to booleans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawFieldSelection")]
pub enum FieldSelection {
    /// Report each page as its URL string
    #[default]
    UrlOnly,

    /// Report each page as a mapping of these fields (plus `loc`)
    Fields(BTreeSet<SiteField>),
}

impl FieldSelection {
    /// Builds a selection from the given fields
    pub fn fields(fields: impl IntoIterator<Item = SiteField>) -> Self {
        Self::Fields(fields.into_iter().collect())
    }

    /// Returns true if pages are reported as bare URLs
    pub fn is_url_only(&self) -> bool {
        matches!(self, Self::UrlOnly)
    }

    /// Projects a `<url>` element into a [`SiteEntry`]
    ///
    /// Returns `None` for entries without a `loc`.
    pub fn project(&self, entry: &Element, sitemap_url: &str) -> Option<SiteEntry> {
        let loc = entry.child_text("loc")?;

        match self {
            Self::UrlOnly => Some(SiteEntry::Url(loc.to_string())),
            Self::Fields(fields) => {
                let mut values = BTreeMap::new();
                values.insert(SiteField::Loc, loc.to_string());
                for field in fields {
                    if let Some(value) = field.extract(entry, sitemap_url) {
                        values.insert(*field, value);
                    }
                }
                Some(SiteEntry::Fields(values))
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldSelection {
    Flag(bool),
    Map(BTreeMap<String, bool>),
}

impl TryFrom<RawFieldSelection> for FieldSelection {
    type Error = String;

    fn try_from(raw: RawFieldSelection) -> Result<Self, Self::Error> {
        match raw {
            RawFieldSelection::Flag(false) => Ok(Self::UrlOnly),
            RawFieldSelection::Flag(true) => Err(
                "fields = true is not supported; use false or a table of field names".to_string(),
            ),
            RawFieldSelection::Map(map) => {
                let mut fields = BTreeSet::new();
                for (name, enabled) in map {
                    let field: SiteField = name.parse()?;
                    if enabled {
                        fields.insert(field);
                    }
                }
                Ok(Self::Fields(fields))
            }
        }
    }
}

/// One page discovered by a crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SiteEntry {
    /// Bare page URL
    Url(String),

    /// Selected fields; always contains [`SiteField::Loc`]
    Fields(BTreeMap<SiteField, String>),
}

impl SiteEntry {
    /// Returns the page URL
    pub fn loc(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Fields(values) => values
                .get(&SiteField::Loc)
                .map(String::as_str)
                .unwrap_or_default(),
        }
    }

    /// Returns a projected field, if present
    ///
    /// Bare URL entries only answer for [`SiteField::Loc`].
    pub fn get(&self, field: SiteField) -> Option<&str> {
        match self {
            Self::Url(url) if field == SiteField::Loc => Some(url),
            Self::Url(_) => None,
            Self::Fields(values) => values.get(&field).map(String::as_str),
        }
    }
}
