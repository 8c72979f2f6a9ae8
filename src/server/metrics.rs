use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Metric name prefix for all community sync metrics
const PREFIX: &str = "community";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Sync Metrics
    pub static ref WEBHOOK_EVENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_webhook_events_total"), "Webhook deliveries by outcome"),
        &["entity", "action"]
    ).expect("Failed to create webhook_events_total metric");

    pub static ref WEBHOOK_SIGNATURE_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_webhook_signature_failures_total"),
            "Webhook deliveries rejected by signature verification"
        ),
        &["entity", "reason"]
    ).expect("Failed to create webhook_signature_failures_total metric");

    pub static ref BATCH_SYNC_DOCUMENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_batch_sync_documents_total"),
            "Documents processed by batch sync"
        ),
        &["entity", "status"]
    ).expect("Failed to create batch_sync_documents_total metric");

    // Community Metrics
    pub static ref REGISTRATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_registrations_total"), "Event registration attempts"),
        &["outcome"]
    ).expect("Failed to create registrations_total metric");

    pub static ref SUBSCRIPTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_subscriptions_total"), "Newsletter subscription changes"),
        &["outcome"]
    ).expect("Failed to create subscriptions_total metric");

    pub static ref NOTIFICATION_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_notification_failures_total"),
            "Notifications that could not be sent or scheduled"
        ),
        &["workflow"]
    ).expect("Failed to create notification_failures_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(WEBHOOK_EVENTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(WEBHOOK_SIGNATURE_FAILURES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(BATCH_SYNC_DOCUMENTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(REGISTRATIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SUBSCRIPTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(NOTIFICATION_FAILURES_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record the outcome of a webhook delivery
pub fn record_webhook(entity: &str, action: &str) {
    WEBHOOK_EVENTS_TOTAL
        .with_label_values(&[entity, action])
        .inc();
}

pub fn record_signature_failure(entity: &str, reason: &str) {
    WEBHOOK_SIGNATURE_FAILURES_TOTAL
        .with_label_values(&[entity, reason])
        .inc();
}

pub fn record_batch_document(entity: &str, status: &str) {
    BATCH_SYNC_DOCUMENTS_TOTAL
        .with_label_values(&[entity, status])
        .inc();
}

pub fn record_registration(outcome: &str) {
    REGISTRATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_subscription(outcome: &str) {
    SUBSCRIPTIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_notification_failure(workflow: &str) {
    NOTIFICATION_FAILURES_TOTAL
        .with_label_values(&[workflow])
        .inc();
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
