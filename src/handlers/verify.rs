use axum::extract::{Query, State};
use axum::http::StatusCode;
use std::sync::Arc;

use crate::models::VerifyQuery;
use crate::state::AppState;

pub const INVALID_TOKEN: &str = "Token de verificação inválido";

// Echo the challenge back only when the platform presents our secret
pub fn verify_handshake(expected_token: &str, query: &VerifyQuery) -> (StatusCode, String) {
    if query.verify_token.as_deref() == Some(expected_token) {
        let challenge = query.challenge.clone().unwrap_or_default();
        return (StatusCode::OK, challenge);
    }
    (StatusCode::FORBIDDEN, INVALID_TOKEN.to_string())
}

pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> (StatusCode, String) {
    let (status, body) = verify_handshake(&state.verification_token, &query);
    if status.is_success() {
        tracing::info!(mode = query.mode.as_deref().unwrap_or(""), "webhook verified");
    } else {
        tracing::warn!("webhook verification failed");
    }
    (status, body)
}
