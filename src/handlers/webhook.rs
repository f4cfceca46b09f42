use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;

use crate::dispatch::Outcome;
use crate::error::WebhookError;
use crate::metrics::REQUEST_LATENCY;
use crate::models::extract_messages;
use crate::signature::{SIGNATURE_HEADER, verify_signature};
use crate::state::AppState;

pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, WebhookError> {
    let start_time = Instant::now();

    if let Some(secret) = &state.app_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(&body, signature, secret) {
            tracing::warn!("webhook signature mismatch");
            return Err(WebhookError::InvalidSignature);
        }
    }

    let payload: Value =
        serde_json::from_slice(&body).map_err(|e| WebhookError::MalformedBody(e.to_string()))?;
    let messages = extract_messages(&payload);

    let outcome = state.dispatcher.dispatch(&messages, chrono::Utc::now()).await;
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    match outcome? {
        Outcome::Completed { replied } => {
            tracing::debug!(messages = messages.len(), replied, "event processed");
            Ok(Json(json!({ "status": "ok" })))
        }
        Outcome::RateLimited { sender } => {
            tracing::info!(sender = %sender, "batch stopped by rate limiter");
            Err(WebhookError::RateLimited)
        }
    }
}
