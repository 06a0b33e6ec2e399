//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use flate2::write::GzEncoder;
use flate2::Compression;
use sitemap_ripple::config::load_config;
use sitemap_ripple::{
    Config, FailureKind, FetchOptions, FieldSelection, SiteEntry, SiteField, Sitemapper,
};
use std::io::Write;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a urlset listing the given page URLs
fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

/// Builds a sitemap index referencing the given sitemap URLs
fn sitemap_index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<sitemap><loc>{}</loc></sitemap>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

async fn mount_xml(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn pages(base: &str, names: &[&str]) -> Vec<String> {
    names.iter().map(|name| format!("{}/{}", base, name)).collect()
}

fn locs(sites: &[SiteEntry]) -> Vec<&str> {
    sites.iter().map(SiteEntry::loc).collect()
}

fn sitemapper(url: &str) -> Sitemapper {
    Sitemapper::new(Config::new(url)).expect("Failed to build sitemapper")
}

#[tokio::test]
async fn test_plain_urlset_in_document_order() {
    let server = MockServer::start().await;
    let base = server.uri();
    let expected = pages(&base, &["a", "b", "c", "d"]);
    mount_xml(&server, "/sitemap.xml", urlset(&expected)).await;

    let url = format!("{}/sitemap.xml", base);
    let result = sitemapper(&url)
        .fetch(FetchOptions::default())
        .await
        .expect("Crawl should succeed");

    assert_eq!(result.url, url);
    assert_eq!(locs(&result.sites), expected);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_index_with_one_failing_child() {
    let server = MockServer::start().await;
    let base = server.uri();

    let good = format!("{}/good.xml", base);
    let bad = format!("{}/bad.xml", base);
    mount_xml(&server, "/index.xml", sitemap_index(&[good, bad.clone()])).await;
    mount_xml(&server, "/good.xml", urlset(&pages(&base, &["one", "two"]))).await;
    Mock::given(method("GET"))
        .and(path("/bad.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = sitemapper(&format!("{}/index.xml", base))
        .fetch(FetchOptions::default())
        .await
        .expect("Partial failure is not a crawl failure");

    assert_eq!(result.sites.len(), 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].url, bad);
    assert_eq!(result.errors[0].kind, FailureKind::Http);
    assert_eq!(result.errors[0].retries, 0);
}

#[tokio::test]
async fn test_retries_then_records_one_error() {
    let server = MockServer::start().await;
    let retries = 2;

    Mock::given(method("GET"))
        .and(path("/flaky.xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(u64::from(retries) + 1)
        .mount(&server)
        .await;

    let url = format!("{}/flaky.xml", server.uri());
    let mut config = Config::new(&url);
    config.crawler.retries = retries;

    let result = Sitemapper::new(config)
        .unwrap()
        .fetch(FetchOptions::default())
        .await
        .unwrap();

    assert!(result.sites.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].retries, retries);
    assert_eq!(result.errors[0].url, url);
}

#[tokio::test]
async fn test_retry_recovers_after_failure() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Mounted first, so it answers the first request and then steps aside
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_xml(&server, "/sitemap.xml", urlset(&pages(&base, &["a"]))).await;

    let mut config = Config::new(format!("{}/sitemap.xml", base));
    config.crawler.retries = 1;

    let result = Sitemapper::new(config)
        .unwrap()
        .fetch(FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(locs(&result.sites), pages(&base, &["a"]));
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_gzip_matches_plain() {
    let server = MockServer::start().await;
    let base = server.uri();
    let xml = urlset(&pages(&base, &["x", "y", "z"]));

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(xml.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    mount_xml(&server, "/sitemap.xml", xml).await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(compressed))
        .mount(&server)
        .await;

    let crawler = sitemapper(&format!("{}/sitemap.xml", base));
    let plain = crawler.fetch(FetchOptions::default()).await.unwrap();
    let gzipped = crawler
        .fetch(FetchOptions::url(format!("{}/sitemap.xml.gz", base)))
        .await
        .unwrap();

    assert_eq!(plain.sites, gzipped.sites);
    assert_eq!(gzipped.sites.len(), 3);
    assert!(gzipped.errors.is_empty());
}

#[tokio::test]
async fn test_nested_indexes_with_fields_and_attribution() {
    let server = MockServer::start().await;
    let base = server.uri();

    let nested = format!("{}/nested.xml", base);
    let posts = format!("{}/posts.xml", base);
    let pages_xml = format!("{}/pages.xml", base);

    mount_xml(&server, "/root.xml", sitemap_index(&[nested, pages_xml.clone()])).await;
    mount_xml(&server, "/nested.xml", sitemap_index(&[posts.clone()])).await;
    mount_xml(
        &server,
        "/posts.xml",
        format!(
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
                       xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
                <url>
                    <loc> {base}/post-1 </loc>
                    <lastmod>2024-03-01</lastmod>
                    <priority>0.8</priority>
                    <image:image><image:loc>{base}/img.png</image:loc></image:image>
                </url>
            </urlset>"#,
            base = base
        ),
    )
    .await;
    mount_xml(&server, "/pages.xml", urlset(&pages(&base, &["about"]))).await;

    let mut config = Config::new(format!("{}/root.xml", base));
    config.output.fields = FieldSelection::fields([
        SiteField::Lastmod,
        SiteField::Priority,
        SiteField::Sitemap,
        SiteField::ImageLoc,
    ]);

    let result = Sitemapper::new(config)
        .unwrap()
        .fetch(FetchOptions::default())
        .await
        .unwrap();

    assert!(result.errors.is_empty());
    assert_eq!(result.sites.len(), 2);

    let post = &result.sites[0];
    assert_eq!(post.loc(), format!("{}/post-1", base));
    assert_eq!(post.get(SiteField::Lastmod), Some("2024-03-01"));
    assert_eq!(post.get(SiteField::Priority), Some("0.8"));
    assert_eq!(post.get(SiteField::Sitemap), Some(posts.as_str()));
    let image = format!("{}/img.png", base);
    assert_eq!(post.get(SiteField::ImageLoc), Some(image.as_str()));

    let about = &result.sites[1];
    assert_eq!(about.get(SiteField::Sitemap), Some(pages_xml.as_str()));
    assert_eq!(about.get(SiteField::Lastmod), None);
}

#[tokio::test]
async fn test_lastmod_floor() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(
        &server,
        "/sitemap.xml",
        format!(
            r#"<urlset>
                <url><loc>{base}/old</loc><lastmod>2019-05-01</lastmod></url>
                <url><loc>{base}/new</loc><lastmod>2024-05-01T08:30:00+02:00</lastmod></url>
                <url><loc>{base}/undated</loc></url>
            </urlset>"#,
            base = base
        ),
    )
    .await;

    let url = format!("{}/sitemap.xml", base);
    let mut config = Config::new(&url);
    config.crawler.lastmod = 1_704_067_200_000; // 2024-01-01T00:00:00Z

    let filtered = Sitemapper::new(config)
        .unwrap()
        .fetch(FetchOptions::default())
        .await
        .unwrap();
    assert_eq!(locs(&filtered.sites), pages(&base, &["new"]));

    let unfiltered = sitemapper(&url).fetch(FetchOptions::default()).await.unwrap();
    assert_eq!(unfiltered.sites.len(), 3);
}

#[tokio::test]
async fn test_exclusions_apply_to_children_and_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    let kept = format!("{}/kept.xml", base);
    let skipped = format!("{}/archive.xml", base);
    mount_xml(&server, "/index.xml", sitemap_index(&[kept, skipped])).await;
    mount_xml(
        &server,
        "/kept.xml",
        urlset(&pages(&base, &["post", "tag/rust", "file.pdf"])),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/archive.xml"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = Config::new(format!("{}/index.xml", base));
    config.filter.exclusions = vec![
        "archive".to_string(),
        "/tag/".to_string(),
        r"\.pdf$".to_string(),
    ];

    let result = Sitemapper::new(config)
        .unwrap()
        .fetch(FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(locs(&result.sites), pages(&base, &["post"]));
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_timeout_is_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(urlset(&[]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let url = format!("{}/slow.xml", server.uri());
    let mut config = Config::new(&url);
    config.crawler.timeout = 100;
    let crawler = Sitemapper::new(config).unwrap();

    let started = std::time::Instant::now();
    let result = crawler.fetch(FetchOptions::default()).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, FailureKind::Timeout);
    assert!(result.errors[0].message.contains("100ms"));
    assert_eq!(crawler.active_deadlines(), 0);
}

#[tokio::test]
async fn test_unknown_state_and_parse_errors() {
    let server = MockServer::start().await;
    let base = server.uri();

    let html = format!("{}/page.html", base);
    let broken = format!("{}/broken.xml", base);
    let empty = format!("{}/empty.xml", base);
    mount_xml(
        &server,
        "/index.xml",
        sitemap_index(&[html.clone(), broken.clone(), empty.clone()]),
    )
    .await;
    mount_xml(&server, "/page.html", "<html><body>hi</body></html>".to_string()).await;
    mount_xml(&server, "/broken.xml", "<urlset><url><loc>".to_string()).await;
    mount_xml(&server, "/empty.xml", "<urlset></urlset>".to_string()).await;

    let result = sitemapper(&format!("{}/index.xml", base))
        .fetch(FetchOptions::default())
        .await
        .unwrap();

    assert!(result.sites.is_empty());
    let kinds: Vec<_> = result.errors.iter().map(|e| (e.url.clone(), e.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (html, FailureKind::UnknownState),
            (broken, FailureKind::Parse),
            (empty, FailureKind::UnknownState),
        ]
    );
}

#[tokio::test]
async fn test_fetch_url_overrides_configured_url() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/other.xml", urlset(&pages(&base, &["other"]))).await;
    Mock::given(method("GET"))
        .and(path("/configured.xml"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let crawler = sitemapper(&format!("{}/configured.xml", base));
    let other = format!("{}/other.xml", base);
    let result = crawler.fetch(FetchOptions::url(&other)).await.unwrap();

    assert_eq!(result.url, other);
    assert_eq!(locs(&result.sites), pages(&base, &["other"]));
}

#[tokio::test]
async fn test_configured_headers_are_sent() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .and(wiremock::matchers::header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&pages(&base, &["a"]))))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::new(format!("{}/sitemap.xml", base));
    config
        .request
        .headers
        .insert("x-api-key".to_string(), "secret".to_string());

    let result = Sitemapper::new(config)
        .unwrap()
        .fetch(FetchOptions::default())
        .await
        .unwrap();
    assert_eq!(result.sites.len(), 1);
}

#[tokio::test]
async fn test_crawl_from_config_file() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/sitemap.xml", urlset(&pages(&base, &["a", "skip-me"]))).await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("ripple.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
url = "{}/sitemap.xml"

[crawler]
timeout = 2000
concurrency = 4

[filter]
exclusions = ["skip-me"]

[output]
fields = {{ sitemap = true }}
"#,
            base
        ),
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let crawler = Sitemapper::new(config).unwrap();
    let result = crawler.fetch(FetchOptions::default()).await.unwrap();

    assert_eq!(result.sites.len(), 1);
    let site = &result.sites[0];
    assert_eq!(site.loc(), format!("{}/a", base));
    let sitemap = format!("{}/sitemap.xml", base);
    assert_eq!(site.get(SiteField::Sitemap), Some(sitemap.as_str()));
    assert_eq!(crawler.active_deadlines(), 0);
}

#[tokio::test]
async fn test_unreachable_and_corrupt_children_are_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();

    let good = format!("{}/good.xml", base);
    // Nothing listens on port 1
    let unreachable = "http://127.0.0.1:1/unreachable.xml".to_string();
    let corrupt = format!("{}/corrupt.xml.gz", base);
    mount_xml(
        &server,
        "/index.xml",
        sitemap_index(&[good, unreachable.clone(), corrupt.clone()]),
    )
    .await;
    mount_xml(&server, "/good.xml", urlset(&pages(&base, &["kept"]))).await;
    Mock::given(method("GET"))
        .and(path("/corrupt.xml.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x1f, 0x8b, 0xde, 0xad, 0xbe]))
        .mount(&server)
        .await;

    let result = sitemapper(&format!("{}/index.xml", base))
        .fetch(FetchOptions::default())
        .await
        .expect("Unreachable children are not a crawl failure");

    assert_eq!(locs(&result.sites), pages(&base, &["kept"]));
    let kinds: Vec<_> = result.errors.iter().map(|e| (e.url.clone(), e.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (unreachable, FailureKind::Request),
            (corrupt, FailureKind::Decompress),
        ]
    );
    assert!(result.errors.iter().all(|e| e.retries == 0));
}

#[tokio::test]
async fn test_unusable_url_is_reported_not_raised() {
    let crawler = Sitemapper::new(Config::default()).unwrap();

    let result = crawler
        .fetch(FetchOptions::url("not a url"))
        .await
        .expect("Only cancellation fails a fetch");

    assert_eq!(result.url, "not a url");
    assert!(result.sites.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, FailureKind::Request);
    assert_eq!(result.errors[0].url, "not a url");
}
