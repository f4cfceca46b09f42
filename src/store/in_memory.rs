use async_trait::async_trait;
use dashmap::DashMap;

use super::DocumentStore;
use crate::error::StoreError;
use crate::models::{RateLimitRecord, UserRecord};

// Process-local store, one map per collection
#[derive(Default)]
pub struct InMemoryStore {
    records: DashMap<String, RateLimitRecord>,
    users: DashMap<String, UserRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, sender_id: &str) -> Option<RateLimitRecord> {
        self.records.get(sender_id).map(|r| *r)
    }

    pub fn user(&self, user_id: &str) -> Option<UserRecord> {
        self.users.get(user_id).map(|u| u.clone())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    // Seed a record directly, bypassing the limiter
    pub fn put_record(&self, sender_id: &str, record: RateLimitRecord) {
        self.records.insert(sender_id.to_string(), record);
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_record(&self, sender_id: &str) -> Result<Option<RateLimitRecord>, StoreError> {
        Ok(self.record(sender_id))
    }

    async fn create_record(&self, sender_id: &str, record: &RateLimitRecord) -> Result<(), StoreError> {
        self.records.insert(sender_id.to_string(), *record);
        Ok(())
    }

    async fn update_record(&self, sender_id: &str, record: &RateLimitRecord) -> Result<(), StoreError> {
        let mut entry = self.records.entry(sender_id.to_string()).or_default();
        entry.last_request_time = record.last_request_time;
        entry.request_count = record.request_count;
        Ok(())
    }

    async fn user_exists(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.users.contains_key(user_id))
    }

    async fn create_user(&self, user_id: &str, user: &UserRecord) -> Result<(), StoreError> {
        self.users.insert(user_id.to_string(), user.clone());
        Ok(())
    }
}
