use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Histogram, TextEncoder, register_counter, register_counter_vec,
    register_histogram,
};


lazy_static! {
    pub static ref MESSAGES_TOTAL: Counter =
        register_counter!("webhook_messages_total", "Inbound text messages seen").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("webhook_rate_limited_total", "Messages rejected by the rate limiter").unwrap();
    pub static ref DIALOG_FAILURES: Counter =
        register_counter!("webhook_dialog_failures_total", "Dialog service calls that fell back").unwrap();
    pub static ref NOTIFICATIONS_SENT: CounterVec = register_counter_vec!(
        "webhook_notifications_total",
        "Replies posted to the send API, by HTTP status",
        &["status"]
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "webhook_request_latency_seconds",
        "Webhook POST handling latency in seconds"
    )
    .unwrap();
}

// Prometheus text exposition of everything registered above
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
