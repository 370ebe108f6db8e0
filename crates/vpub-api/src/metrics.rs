//! Prometheus metrics for the API server.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vpub_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vpub_http_request_duration_seconds";

    // Upload pipeline metrics
    pub const UPLOADS_TOTAL: &str = "vpub_uploads_total";
    pub const UPLOAD_FAILURES_TOTAL: &str = "vpub_upload_failures_total";
    pub const FFMPEG_DURATION_SECONDS: &str = "vpub_ffmpeg_duration_seconds";
    pub const PUBLISH_DURATION_SECONDS: &str = "vpub_publish_duration_seconds";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a completed upload.
pub fn record_upload() {
    counter!(names::UPLOADS_TOTAL).increment(1);
}

/// Record a failed upload, labelled by the stage that failed.
pub fn record_upload_failure(stage: &'static str) {
    counter!(names::UPLOAD_FAILURES_TOTAL, "stage" => stage).increment(1);
}

/// Record an FFmpeg invocation duration.
pub fn record_ffmpeg_duration(duration_secs: f64) {
    histogram!(names::FFMPEG_DURATION_SECONDS).record(duration_secs);
}

/// Record an object-store publish duration.
pub fn record_publish_duration(duration_secs: f64) {
    histogram!(names::PUBLISH_DURATION_SECONDS).record(duration_secs);
}
