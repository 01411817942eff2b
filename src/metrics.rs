/// Metrics for Gym Desk
///
/// Prometheus counters served on `/metrics`:
/// - HTTP request counts and latencies
/// - Membership updates and recorded payments
/// - Admin logins
/// - Background job execution

use crate::error::GymError;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    /// Active HTTP requests
    pub static ref HTTP_REQUESTS_ACTIVE: IntGauge = register_int_gauge!(
        "http_requests_active",
        "Number of HTTP requests currently being processed"
    )
    .unwrap();

    // ========== Membership Metrics ==========

    /// Membership update transactions by outcome
    pub static ref MEMBER_UPDATES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "member_updates_total",
        "Total number of membership update transactions",
        &["outcome"]
    )
    .unwrap();

    /// Payments recorded by payment method
    pub static ref PAYMENTS_RECORDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "payments_recorded_total",
        "Total number of payments recorded",
        &["method"]
    )
    .unwrap();

    // ========== Auth Metrics ==========

    /// Admin login attempts by outcome
    pub static ref LOGINS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "admin_logins_total",
        "Total number of admin login attempts",
        &["outcome"]
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by job type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();

    /// Background job duration in seconds
    pub static ref BACKGROUND_JOB_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "background_job_duration_seconds",
        "Background job execution time in seconds",
        &["job_type"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a membership update outcome
pub fn record_member_update(outcome: &str) {
    MEMBER_UPDATES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a committed payment
pub fn record_payment(method: &str) {
    PAYMENTS_RECORDED_TOTAL.with_label_values(&[method]).inc();
}

/// Record a login attempt
pub fn record_login(outcome: &str) {
    LOGINS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str, duration: f64) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
    BACKGROUND_JOB_DURATION_SECONDS
        .with_label_values(&[job_type])
        .observe(duration);
}

/// Low-cardinality label for an error
pub fn error_label(error: &GymError) -> &'static str {
    match error {
        GymError::Validation(_) => "validation",
        GymError::Conflict(_) => "conflict",
        GymError::NotFound(_) => "not_found",
        GymError::Authentication(_) => "authentication",
        GymError::Database(_) | GymError::Migration(_) => "database",
        GymError::Internal(_) | GymError::Io(_) => "internal",
    }
}
