//! WhatsApp Cloud API webhook that answers users through a Dialogflow CX agent,
//! with a per-sender rate limiter kept in Firestore.

pub mod config;
pub mod dialog;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod notifier;
pub mod rate_limit;
pub mod registry;
pub mod router;
pub mod signature;
pub mod state;
pub mod store;
