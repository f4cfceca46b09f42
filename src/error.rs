use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

// Document store failures. Fatal for the message being processed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("document store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode document: {0}")]
    Decode(String),

    #[error("{0:?} is not a usable document id")]
    InvalidKey(String),
}

// Dialog service failures. Never leave the conversation bridge.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("dialog service unavailable: {0}")]
    DependencyUnavailable(#[source] reqwest::Error),

    #[error("dialog service returned {0}")]
    Status(u16),

    #[error("could not decode dialog response: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("send API unreachable: {0}")]
    Transport(#[source] reqwest::Error),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

// Everything the POST webhook path can answer with besides `{"status":"ok"}`
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("limite de requisições atingido")]
    RateLimited,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed body: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Store(ref e) => {
                tracing::error!(error = %e, "document store failure");
                "internal error".to_string()
            }
            ref other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
