//! XML element tree for sitemap documents
//!
//! Sitemaps are small, regular documents, so the whole body is read into a
//! tree of [`Element`]s. Every element keeps its children as a sequence, so a
//! `urlset` holding a single `url` has the same shape as one holding
//! thousands.

use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use thiserror::Error;

/// A single XML element with its text content and child elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Element name, without namespace prefix when prefixes are stripped
    pub name: String,

    /// Concatenated text and CDATA content directly inside this element
    pub text: String,

    /// Child elements in document order
    pub children: Vec<Element>,
}

impl Element {
    /// Creates an empty element with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the first child element with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Returns every child element with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Returns the trimmed text of the first child with the given name
    ///
    /// Whitespace-only text counts as absent.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|child| child.text.trim())
            .filter(|text| !text.is_empty())
    }
}

/// Options controlling how a document is turned into a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Drop `prefix:` from element names (`image:loc` becomes `loc`)
    pub strip_namespaces: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strip_namespaces: true,
        }
    }
}

/// Errors raised for documents that are not well-formed XML
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Malformed XML at byte {position}: {message}")]
    Malformed { position: usize, message: String },

    #[error("Document has no root element")]
    Empty,

    #[error("Document has more than one root element")]
    MultipleRoots,

    #[error("Unexpected end of document inside <{0}>")]
    Unclosed(String),

    #[error("Unexpected content outside the root element")]
    StrayContent,
}

/// Parses a byte buffer into an element tree
///
/// # Arguments
///
/// * `bytes` - The raw (already decompressed) document
/// * `options` - Tree building options
///
/// # Returns
///
/// * `Ok(Element)` - The document's root element
/// * `Err(DocumentError)` - The input is not a well-formed document
///
/// # Example
///
/// ```
/// use sitemap_ripple::sitemap::{parse_document, ParseOptions};
///
/// let xml = br#"<urlset><url><loc>https://example.com/</loc></url></urlset>"#;
/// let root = parse_document(xml, ParseOptions::default()).unwrap();
/// assert_eq!(root.name, "urlset");
/// assert_eq!(root.children[0].child_text("loc"), Some("https://example.com/"));
/// ```
pub fn parse_document(bytes: &[u8], options: ParseOptions) -> Result<Element, DocumentError> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| DocumentError::Malformed {
                position: reader.buffer_position(),
                message: e.to_string(),
            })?;

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(DocumentError::MultipleRoots);
                }
                stack.push(Element::new(element_name(start.name(), options)));
            }
            Event::Empty(empty) => {
                let element = Element::new(element_name(empty.name(), options));
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or(DocumentError::StrayContent)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| DocumentError::Malformed {
                    position: reader.buffer_position(),
                    message: e.to_string(),
                })?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(cdata) => {
                let raw = cdata.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&raw))?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes
            _ => {}
        }

        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(DocumentError::Unclosed(open.name));
    }

    root.ok_or(DocumentError::Empty)
}

fn element_name(name: QName<'_>, options: ParseOptions) -> String {
    if options.strip_namespaces {
        String::from_utf8_lossy(name.local_name().as_ref()).into_owned()
    } else {
        String::from_utf8_lossy(name.as_ref()).into_owned()
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DocumentError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(DocumentError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), DocumentError> {
    match stack.last_mut() {
        Some(element) => element.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => return Err(DocumentError::StrayContent),
    }
    Ok(())
}
