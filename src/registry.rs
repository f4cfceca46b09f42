use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::UserRecord;
use crate::store::DocumentStore;

// Keeps a users/{id} document for everyone who has written to us
pub struct UserRegistry {
    store: Arc<dyn DocumentStore>,
}

impl UserRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns `true` when a new user document was created.
    pub async fn ensure_registered(&self, user_id: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        if self.store.user_exists(user_id).await? {
            return Ok(false);
        }
        self.store.create_user(user_id, &UserRecord::new(user_id, now)).await?;
        tracing::info!(sender = user_id, "registered new user");
        Ok(true)
    }
}
