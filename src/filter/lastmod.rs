use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parses a sitemap `lastmod` value into epoch milliseconds
///
/// Accepts the W3C datetime forms sitemaps use: full RFC 3339 timestamps,
/// minute precision (`2024-01-15T10:30+02:00`), timestamps without an offset
/// (read as UTC), and the truncated date forms `YYYY-MM-DD`, `YYYY-MM` and
/// `YYYY` (midnight UTC at the start of the period).
///
/// # Examples
///
/// ```
/// use sitemap_ripple::filter::parse_lastmod;
///
/// assert_eq!(parse_lastmod("2024-01-15"), Some(1_705_276_800_000));
/// assert_eq!(parse_lastmod("2024-01-15T00:00:00Z"), Some(1_705_276_800_000));
/// assert_eq!(parse_lastmod("yesterday"), None);
/// ```
pub fn parse_lastmod(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // %:z does not read a bare `Z`
    let normalized = match value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        Some(rest) if rest.contains('T') => format!("{}+00:00", rest),
        _ => value.to_string(),
    };

    if let Ok(datetime) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(datetime.timestamp_millis());
    }

    if let Ok(datetime) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M%:z") {
        return Some(datetime.timestamp_millis());
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }

    let date = match value.len() {
        10 => NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
        7 => NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d").ok(),
        4 if value.chars().all(|c| c.is_ascii_digit()) => value
            .parse()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1)),
        _ => None,
    }?;

    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

/// Decides whether an entry survives the `lastmod` floor
///
/// A floor of `0` disables the filter entirely. Otherwise the entry must
/// carry a `lastmod` that parses and is not earlier than the floor.
///
/// # Arguments
///
/// * `lastmod` - The entry's raw `lastmod` text, if any
/// * `floor` - Minimum modification time in epoch milliseconds
pub fn passes_lastmod(lastmod: Option<&str>, floor: i64) -> bool {
    if floor == 0 {
        return true;
    }

    match lastmod.and_then(parse_lastmod) {
        Some(modified) => modified >= floor,
        None => false,
    }
}
