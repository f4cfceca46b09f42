use std::sync::Arc;

use crate::error::StoreError;
use crate::models::RateLimitRecord;
use crate::store::DocumentStore;

// Max admitted requests per sender inside one block window
pub const RATE_LIMIT: i64 = 10;
// Seconds after which a sender's counter starts over
pub const BLOCK_TIME: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    // First request ever, create the record
    Create(RateLimitRecord),
    // Admitted, persist the updated counter
    Update(RateLimitRecord),
    // Over quota, nothing is written
    Reject,
}

/// Decide what to do with a request arriving at `now`.
///
/// The quota check uses the elapsed time since the last counted request rather
/// than a fixed window start, so a burst straddling the boundary can go over
/// `RATE_LIMIT` per `BLOCK_TIME`.
pub fn evaluate(record: Option<&RateLimitRecord>, now: i64) -> Decision {
    let Some(record) = record else {
        return Decision::Create(RateLimitRecord {
            last_request_time: now,
            request_count: 1,
            blocks: 0,
        });
    };

    let elapsed = now - record.last_request_time;
    if elapsed < BLOCK_TIME && record.request_count >= RATE_LIMIT {
        return Decision::Reject;
    }

    let mut next = *record;
    if elapsed >= BLOCK_TIME {
        next.request_count = 0;
    }
    next.request_count += 1;
    next.last_request_time = now;
    Decision::Update(next)
}

// Per-sender gate backed by the document store. The read and the write are two
// separate calls, so concurrent requests for one sender can under-count.
pub struct RateLimiter {
    store: Arc<dyn DocumentStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn admit(&self, sender_id: &str, now: i64) -> Result<bool, StoreError> {
        let current = self.store.get_record(sender_id).await?;

        match evaluate(current.as_ref(), now) {
            Decision::Create(record) => {
                self.store.create_record(sender_id, &record).await?;
                tracing::debug!(sender = sender_id, "first request, counter created");
                Ok(true)
            }
            Decision::Update(record) => {
                self.store.update_record(sender_id, &record).await?;
                tracing::debug!(sender = sender_id, count = record.request_count, "request admitted");
                Ok(true)
            }
            Decision::Reject => {
                tracing::info!(sender = sender_id, "rate limit exceeded");
                Ok(false)
            }
        }
    }
}
