use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{RateLimitRecord, UserRecord};

pub mod firestore;
pub mod in_memory;

pub use firestore::FirestoreStore;
pub use in_memory::InMemoryStore;

/// Keyed document access used by the rate limiter and the user registry.
///
/// Rate-limit records and users live in separate collections, both keyed by the
/// platform sender id. Reads return `Ok(None)` / `Ok(false)` when the document is
/// absent; any other failure is an error.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_record(&self, sender_id: &str) -> Result<Option<RateLimitRecord>, StoreError>;
    async fn create_record(&self, sender_id: &str, record: &RateLimitRecord) -> Result<(), StoreError>;
    /// Overwrites `last_request_time` and `request_count`. `blocks` is left untouched.
    async fn update_record(&self, sender_id: &str, record: &RateLimitRecord) -> Result<(), StoreError>;

    async fn user_exists(&self, user_id: &str) -> Result<bool, StoreError>;
    async fn create_user(&self, user_id: &str, user: &UserRecord) -> Result<(), StoreError>;
}

// Pick the backend the configuration asks for
pub fn from_config(config: &Config, client: reqwest::Client) -> Arc<dyn DocumentStore> {
    match &config.firestore {
        Some(firestore) => {
            tracing::info!(project = %firestore.project_id, "using firestore document store");
            Arc::new(FirestoreStore::new(client, firestore))
        }
        None => {
            tracing::warn!("using in-memory document store, counters are lost on restart");
            Arc::new(InMemoryStore::new())
        }
    }
}
