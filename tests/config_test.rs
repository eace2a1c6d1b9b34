//! Tests for configuration loading from files and environment

use serial_test::serial;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use vnews::config::Config;

const VNEWS_VARS: &[&str] = &[
    "VNEWS_CACHE_TTL",
    "VNEWS_PAGE_SIZE",
    "VNEWS_PREFETCH_PAGES",
    "VNEWS_SCROLL_PREFETCH_PAGES",
    "VNEWS_SCROLL_THRESHOLD",
    "VNEWS_CONTENT_SIGNATURES",
    "VNEWS_GALLERY_MARKER",
    "VNEWS_PLACEHOLDER",
    "VNEWS_API_URL",
    "VNEWS_REQUEST_TIMEOUT",
    "VNEWS_MAX_RETRIES",
    "VNEWS_RETRY_BASE_DELAY_MS",
    "VNEWS_RATE_LIMIT",
    "VNEWS_USER_AGENT",
    "VNEWS_LOG_LEVEL",
    "VNEWS_LOG_FORMAT",
];

fn clear_env() {
    for name in VNEWS_VARS {
        std::env::remove_var(name);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(content.as_bytes()).expect("write temp config");
    file
}

// ============================================================================
// TOML files
// ============================================================================

#[test]
fn test_config_file_roundtrip_sections() {
    let file = write_config(
        r#"
[cache]
ttl_secs = 120

[feed]
page_size = 10
prefetch_pages = 2
scroll_prefetch_pages = 1
scroll_threshold = 0.8

[extraction]
content_signatures = ["article-body", "fck_detail"]
gallery_marker = "photo-grid"
placeholder = "Nội dung đang cập nhật"

[api]
base_url = "https://news.example.vn/api/v2"
timeout_secs = 10
requests_per_second = 2

[logging]
level = "debug"
format = "json"
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.cache_ttl(), Duration::from_secs(120));
    assert_eq!(config.feed.page_size, 10);
    assert_eq!(config.feed.prefetch_pages, 2);
    assert_eq!(config.feed.scroll_prefetch_pages, 1);
    assert_eq!(
        config.extraction.content_signatures,
        vec!["article-body", "fck_detail"]
    );
    assert_eq!(config.extraction.gallery_marker, "photo-grid");
    assert_eq!(config.extraction.placeholder, "Nội dung đang cập nhật");
    assert_eq!(config.api.base_url, "https://news.example.vn/api/v2");
    assert_eq!(config.request_timeout(), Duration::from_secs(10));
    assert_eq!(config.api.requests_per_second, 2);
    // Keys left out keep their defaults.
    assert_eq!(config.api.max_retries, 3);
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_empty_config_file_is_default() {
    let file = write_config("");
    let config = Config::from_file(file.path()).unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.feed.page_size, 20);
    assert_eq!(config.cache.ttl_secs, 300);
}

#[test]
fn test_malformed_config_file() {
    let file = write_config("[cache\nttl_secs = ");
    let err = Config::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}

#[test]
fn test_wrong_type_in_config_file() {
    let file = write_config("[feed]\npage_size = \"twenty\"\n");
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_missing_config_file() {
    let err = Config::from_file(std::path::Path::new("/nonexistent/vnews.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_file_with_invalid_values_fails_validation() {
    let file = write_config("[feed]\nscroll_threshold = 0.0\n");
    let config = Config::from_file(file.path()).unwrap();
    assert!(config.validate().is_err());

    let file = write_config("[extraction]\ncontent_signatures = []\n");
    let config = Config::from_file(file.path()).unwrap();
    assert!(config.validate().is_err());
}

// ============================================================================
// Environment
// ============================================================================

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();

    let config = Config::from_env().unwrap();
    assert_eq!(config.cache.ttl_secs, 300);
    assert_eq!(config.feed.page_size, 20);
    assert_eq!(config.api.base_url, "http://localhost:3001/api");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    std::env::set_var("VNEWS_CACHE_TTL", "60");
    std::env::set_var("VNEWS_PAGE_SIZE", "15");
    std::env::set_var("VNEWS_SCROLL_THRESHOLD", "0.9");
    std::env::set_var("VNEWS_CONTENT_SIGNATURES", " main-body , ,fck_detail ");
    std::env::set_var("VNEWS_API_URL", "https://api.example.vn");
    std::env::set_var("VNEWS_LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.cache_ttl(), Duration::from_secs(60));
    assert_eq!(config.feed.page_size, 15);
    assert!((config.feed.scroll_threshold - 0.9).abs() < f64::EPSILON);
    assert_eq!(
        config.extraction.content_signatures,
        vec!["main-body", "fck_detail"]
    );
    assert_eq!(config.api.base_url, "https://api.example.vn");
    assert_eq!(config.logging.format, "json");
}

#[test]
#[serial]
fn test_from_env_ignores_unparsable_values() {
    clear_env();
    std::env::set_var("VNEWS_CACHE_TTL", "five minutes");
    std::env::set_var("VNEWS_PAGE_SIZE", "-3");
    std::env::set_var("VNEWS_CONTENT_SIGNATURES", " , ");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.cache.ttl_secs, 300);
    assert_eq!(config.feed.page_size, 20);
    assert_eq!(config.extraction.content_signatures[0], "fck_detail");
}
