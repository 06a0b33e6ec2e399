//! HTTP transport for sitemap downloads
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client from the request configuration
//! - Downloading a sitemap body
//! - Sniffing and inflating gzip-compressed bodies

use crate::config::RequestConfig;
use flate2::read::GzDecoder;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy, StatusCode};
use std::borrow::Cow;
use std::io::Read;

/// Default user agent, overridable through `request.headers`
const USER_AGENT: &str = concat!("sitemap-ripple/", env!("CARGO_PKG_VERSION"));

/// First two bytes of every gzip stream
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Result of a completed download
#[derive(Debug)]
pub enum Download {
    /// The server answered with a success status
    Body(Vec<u8>),

    /// The server answered with a non-success status
    Status(StatusCode),
}

/// Builds an HTTP client with proper configuration
///
/// The client carries no timeout of its own: every request is raced against a
/// deadline guard instead.
///
/// # Arguments
///
/// * `config` - The request configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```
/// use sitemap_ripple::config::RequestConfig;
/// use sitemap_ripple::crawler::build_http_client;
///
/// let client = build_http_client(&RequestConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &RequestConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        // Validated with the configuration; skip rather than fail here
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!("Ignoring invalid request header '{}'", name),
        }
    }

    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// Downloads a sitemap
///
/// Non-success statuses are returned as [`Download::Status`] without reading
/// the body.
pub async fn download(client: &Client, url: &str) -> Result<Download, reqwest::Error> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Ok(Download::Status(status));
    }

    Ok(Download::Body(response.bytes().await?.to_vec()))
}

/// Returns true if the body starts with the gzip magic bytes
pub fn is_gzip(body: &[u8]) -> bool {
    body.starts_with(&GZIP_MAGIC)
}

/// Inflates a gzip body, passing anything else through untouched
///
/// Sitemaps are often served as `.xml.gz` files without a
/// `Content-Encoding` header, so the body itself is sniffed.
pub fn decode_body(body: &[u8]) -> std::io::Result<Cow<'_, [u8]>> {
    if !is_gzip(body) {
        return Ok(Cow::Borrowed(body));
    }

    let mut inflated = Vec::new();
    GzDecoder::new(body).read_to_end(&mut inflated)?;
    Ok(Cow::Owned(inflated))
}
