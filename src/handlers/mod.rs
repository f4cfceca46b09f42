mod health;
mod metrics;
mod verify;
mod webhook;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use verify::{INVALID_TOKEN, verify_handler, verify_handshake};
pub use webhook::webhook_handler;
