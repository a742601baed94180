use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, TextEncoder};

static CACHE_LOOKUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "livestream_service_cache_lookups_total",
            "Cache lookups by entity family and outcome",
        ),
        &["family", "outcome"],
    )
    .expect("failed to create livestream_service_cache_lookups_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register livestream_service_cache_lookups_total");
    counter
});

static CACHE_WARMUP_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "livestream_service_cache_warmup_duration_seconds",
            "Time spent loading and swapping a cache snapshot",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["family", "status"],
    )
    .expect("failed to create livestream_service_cache_warmup_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register livestream_service_cache_warmup_duration_seconds");
    histogram
});

static SPAM_REJECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "livestream_service_spam_rejections_total",
        "Comments rejected because they contained an NG-word",
    )
    .expect("failed to create livestream_service_spam_rejections_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register livestream_service_spam_rejections_total");
    counter
});

static PURGED_LIVECOMMENTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "livestream_service_purged_livecomments_total",
        "Existing comments deleted when an NG-word was registered",
    )
    .expect("failed to create livestream_service_purged_livecomments_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register livestream_service_purged_livecomments_total");
    counter
});

pub fn record_cache_lookup(family: &str, hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    CACHE_LOOKUPS_TOTAL
        .with_label_values(&[family, outcome])
        .inc();
}

pub fn observe_warm_up(family: &str, success: bool, elapsed: Duration) {
    let status = if success { "ok" } else { "error" };
    CACHE_WARMUP_DURATION_SECONDS
        .with_label_values(&[family, status])
        .observe(elapsed.as_secs_f64());
}

pub fn record_spam_rejection() {
    SPAM_REJECTIONS_TOTAL.inc();
}

pub fn record_purged_livecomments(count: u64) {
    PURGED_LIVECOMMENTS_TOTAL.inc_by(count);
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_lookup_counters_are_labelled() {
        let before = CACHE_LOOKUPS_TOTAL
            .with_label_values(&["metrics_test", "hit"])
            .get();
        record_cache_lookup("metrics_test", true);
        record_cache_lookup("metrics_test", false);

        assert_eq!(
            CACHE_LOOKUPS_TOTAL
                .with_label_values(&["metrics_test", "hit"])
                .get(),
            before + 1
        );
        assert!(
            CACHE_LOOKUPS_TOTAL
                .with_label_values(&["metrics_test", "miss"])
                .get()
                >= 1
        );
    }

    #[actix_web::test]
    async fn test_serve_metrics_exposes_text_format() {
        record_spam_rejection();
        let response = serve_metrics().await;
        assert!(response.status().is_success());
    }
}
