//! Prometheus metrics for the page cache, preload coordinator and extractor
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, or it is never called, metrics operations are
//! no-ops.

use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

use crate::parser::{ContentBlock, ExtractionResult};

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for page cache and preload metrics
struct FeedMetrics {
    cache_lookups: CounterVec,
    loads_started: CounterVec,
    loads_failed: CounterVec,
    loads_coalesced: CounterVec,
    prefetch_failures: CounterVec,
    in_flight: Gauge,
    request_duration: HistogramVec,
}

/// Container for content extraction metrics
struct ExtractionMetrics {
    documents: CounterVec,
    blocks: CounterVec,
}

static FEED_METRICS: OnceLock<FeedMetrics> = OnceLock::new();

static EXTRACTION_METRICS: OnceLock<ExtractionMetrics> = OnceLock::new();

/// Outcome of the first registration attempt
static METRICS_INIT: OnceLock<Result<(), String>> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once and from several threads; only the first
/// call registers anything, later calls return its outcome.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = vnews::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    METRICS_INIT
        .get_or_init(|| register_metrics().map_err(|e| e.to_string()))
        .clone()
        .map_err(Into::into)
}

fn register_metrics() -> Result<(), Box<dyn std::error::Error>> {
    let feed = FeedMetrics {
        cache_lookups: register_counter_vec!(
            "vnews_cache_lookups_total",
            "Page cache lookups by result",
            &["result"]
        )?,
        loads_started: register_counter_vec!(
            "vnews_page_loads_started_total",
            "Page loads started by category",
            &["category"]
        )?,
        loads_failed: register_counter_vec!(
            "vnews_page_loads_failed_total",
            "Page loads failed by category and error kind",
            &["category", "kind"]
        )?,
        loads_coalesced: register_counter_vec!(
            "vnews_page_loads_coalesced_total",
            "Requests that joined an in-flight load",
            &["category"]
        )?,
        prefetch_failures: register_counter_vec!(
            "vnews_prefetch_failures_total",
            "Background prefetches that failed",
            &["category"]
        )?,
        in_flight: register_gauge!(
            "vnews_page_loads_in_flight",
            "Number of page loads currently in flight"
        )?,
        request_duration: register_histogram_vec!(
            "vnews_http_request_duration_seconds",
            "Backend request duration by endpoint",
            &["endpoint"],
            vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
        )?,
    };

    let extraction = ExtractionMetrics {
        documents: register_counter_vec!(
            "vnews_extraction_documents_total",
            "Documents processed by the content extractor by outcome",
            &["outcome"]
        )?,
        blocks: register_counter_vec!(
            "vnews_extraction_blocks_total",
            "Content blocks emitted by type",
            &["type"]
        )?,
    };

    FEED_METRICS
        .set(feed)
        .map_err(|_| "Feed metrics already initialized")?;
    EXTRACTION_METRICS
        .set(extraction)
        .map_err(|_| "Extraction metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    FEED_METRICS.get().is_some() && EXTRACTION_METRICS.get().is_some()
}

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

// ============================================================================
// Page cache and preload
// ============================================================================

/// Record a page cache lookup
pub fn record_cache_lookup(hit: bool) {
    if let Some(m) = FEED_METRICS.get() {
        let result = if hit { "hit" } else { "miss" };
        m.cache_lookups.with_label_values(&[result]).inc();
    }
}

/// Record the start of a page load
pub fn record_load_started(category_id: u32) {
    if let Some(m) = FEED_METRICS.get() {
        m.loads_started
            .with_label_values(&[category_id.to_string().as_str()])
            .inc();
    }
}

/// Record a failed page load
pub fn record_load_failed(category_id: u32, kind: &str) {
    if let Some(m) = FEED_METRICS.get() {
        m.loads_failed
            .with_label_values(&[category_id.to_string().as_str(), kind])
            .inc();
    }
}

/// Record a request that joined an in-flight load
pub fn record_coalesced(category_id: u32) {
    if let Some(m) = FEED_METRICS.get() {
        m.loads_coalesced
            .with_label_values(&[category_id.to_string().as_str()])
            .inc();
    }
}

/// Record a failed background prefetch
pub fn record_prefetch_failure(category_id: u32) {
    if let Some(m) = FEED_METRICS.get() {
        m.prefetch_failures
            .with_label_values(&[category_id.to_string().as_str()])
            .inc();
    }
}

/// Update the in-flight load gauge
pub fn set_in_flight(count: usize) {
    if let Some(m) = FEED_METRICS.get() {
        m.in_flight.set(count as f64);
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a backend request timer
pub fn start_request_timer(endpoint: &str) -> MetricsTimer {
    match FEED_METRICS.get() {
        Some(m) => MetricsTimer::new(
            m.request_duration
                .with_label_values(&[endpoint])
                .start_timer(),
        ),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Record one extraction outcome and the blocks it produced
pub fn record_extraction(result: &ExtractionResult, fallback: bool) {
    let Some(m) = EXTRACTION_METRICS.get() else {
        return;
    };

    let outcome = if fallback { "fallback" } else { "extracted" };
    m.documents.with_label_values(&[outcome]).inc();

    if fallback {
        return;
    }

    for block in &result.blocks {
        let kind = match block {
            ContentBlock::Text(_) => "text",
            ContentBlock::Image(_) => "image",
        };
        m.blocks.with_label_values(&[kind]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ensure_metrics_initialized() {
        let _ = init_metrics();
    }

    #[test]
    fn test_init_metrics_is_idempotent() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_metrics_initialized() {
        ensure_metrics_initialized();
        assert!(metrics_initialized());
    }

    #[test]
    fn test_encode_metrics() {
        ensure_metrics_initialized();
        record_cache_lookup(true);

        let text = encode_metrics().unwrap();
        assert!(text.contains("vnews_cache_lookups_total"));
    }

    #[test]
    fn test_recording_does_not_panic() {
        ensure_metrics_initialized();
        record_cache_lookup(false);
        record_load_started(1);
        record_load_failed(1, "upstream");
        record_coalesced(1);
        record_prefetch_failure(2);
        set_in_flight(3);
        record_extraction(&ExtractionResult::placeholder("x"), true);
        record_extraction(
            &ExtractionResult::from(vec![ContentBlock::image("u", "")]),
            false,
        );
        let _timer = start_request_timer("metadata");
    }
}
