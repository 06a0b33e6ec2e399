//! Configuration module for Sitemap-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitemap_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitemap.toml")).unwrap();
//! println!("Fan-out per index: {}", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, FilterConfig, OutputConfig, RequestConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_sitemap_url};
