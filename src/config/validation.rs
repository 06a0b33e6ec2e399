use crate::config::types::{Config, CrawlerConfig, RequestConfig};
use crate::filter::ExclusionFilter;
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

/// Upper bound on per-index fan-out
const MAX_CONCURRENCY: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if let Some(url) = &config.url {
        validate_sitemap_url(url)?;
    }
    validate_crawler_config(&config.crawler)?;
    validate_request_config(&config.request)?;
    ExclusionFilter::new(&config.filter.exclusions)?;
    Ok(())
}

/// Validates a sitemap URL: it must parse and use http or https
pub fn validate_sitemap_url(url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid sitemap URL '{}': {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidUrl(format!(
            "Sitemap URL '{}' must use http or https, got '{}'",
            url, scheme
        ))),
    }
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be at least 1ms".to_string(),
        ));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.lastmod < 0 {
        return Err(ConfigError::Validation(format!(
            "lastmod must be an epoch timestamp in milliseconds (>= 0), got {}",
            config.lastmod
        )));
    }

    Ok(())
}

/// Validates transport configuration
fn validate_request_config(config: &RequestConfig) -> Result<(), ConfigError> {
    if let Some(proxy) = &config.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    for (name, value) in &config.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeader(format!("invalid header name '{}'", name)))?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::InvalidHeader(format!("invalid value for header '{}'", name))
        })?;
    }

    Ok(())
}
