/// Metrics and telemetry for Kinship Records
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - Emergency access link issuance and redemption outcomes
/// - Expired token garbage collection
/// - Background job execution

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // ========== Emergency Access Metrics ==========

    /// Emergency access links issued
    pub static ref EMERGENCY_LINKS_ISSUED_TOTAL: IntCounter = register_int_counter!(
        "emergency_links_issued_total",
        "Total number of emergency access links issued"
    )
    .unwrap();

    /// Redemption attempts by outcome
    pub static ref EMERGENCY_REDEMPTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "emergency_redemptions_total",
        "Total number of emergency access redemption attempts",
        &["outcome"]
    )
    .unwrap();

    /// Expired tokens removed by the cleanup job
    pub static ref EMERGENCY_TOKENS_PURGED_TOTAL: IntCounter = register_int_counter!(
        "emergency_tokens_purged_total",
        "Total number of expired emergency access tokens purged"
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
        vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 30.0]
    )
    .unwrap();
}

/// Outcome of an emergency access redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionOutcome {
    Success,
    NotFound,
    Expired,
}

impl RedemptionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionOutcome::Success => "success",
            RedemptionOutcome::NotFound => "not_found",
            RedemptionOutcome::Expired => "expired",
        }
    }
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
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record an issued emergency access link
pub fn record_link_issued() {
    EMERGENCY_LINKS_ISSUED_TOTAL.inc();
}

/// Record a redemption attempt
pub fn record_redemption(outcome: RedemptionOutcome) {
    EMERGENCY_REDEMPTIONS_TOTAL
        .with_label_values(&[outcome.as_str()])
        .inc();
}

/// Record purged tokens
pub fn record_tokens_purged(count: u64) {
    EMERGENCY_TOKENS_PURGED_TOTAL.inc_by(count);
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
