//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "stillwave_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "stillwave_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "stillwave_http_requests_in_flight";

    // Generation metrics
    pub const GENERATION_DURATION_SECONDS: &str = "stillwave_generation_duration_seconds";
    pub const CHUNKS_SYNTHESIZED_TOTAL: &str = "stillwave_chunks_synthesized_total";
    pub const CHUNKS_CACHED_TOTAL: &str = "stillwave_chunks_cached_total";
    pub const CHUNKS_DROPPED_TOTAL: &str = "stillwave_chunks_dropped_total";

    // Mix metrics
    pub const MIX_DURATION_SECONDS: &str = "stillwave_mix_duration_seconds";
    pub const MIX_CACHE_HITS_TOTAL: &str = "stillwave_mix_cache_hits_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "stillwave_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one generation run.
pub fn record_generation(duration_secs: f64, synthesized: usize, cached: usize, dropped: usize) {
    histogram!(names::GENERATION_DURATION_SECONDS).record(duration_secs);
    counter!(names::CHUNKS_SYNTHESIZED_TOTAL).increment(synthesized as u64);
    counter!(names::CHUNKS_CACHED_TOTAL).increment(cached as u64);
    counter!(names::CHUNKS_DROPPED_TOTAL).increment(dropped as u64);
}

/// Record one mix run.
pub fn record_mix(duration_secs: f64, cached: bool) {
    histogram!(names::MIX_DURATION_SECONDS).record(duration_secs);
    if cached {
        counter!(names::MIX_CACHE_HITS_TOTAL).increment(1);
    }
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels.
///
/// Served artifact paths embed UUIDs and fingerprints; collapsing them
/// keeps label cardinality bounded.
fn sanitize_path(path: &str) -> String {
    let path = regex_lite::Regex::new(
        r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
    )
    .unwrap()
    .replace_all(path, ":id");
    let path = regex_lite::Regex::new(r"/audio/(chunks|output|tmp)/[^/]+")
        .unwrap()
        .replace_all(&path, "/audio/$1/:file");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/audio/output/meditation_550e8400-e29b-41d4-a716-446655440000.mp3"),
            "/audio/output/:file"
        );
        assert_eq!(
            sanitize_path("/audio/chunks/8f3a2b.mp3"),
            "/audio/chunks/:file"
        );
        assert_eq!(sanitize_path("/api/audio/generate"), "/api/audio/generate");
    }
}
