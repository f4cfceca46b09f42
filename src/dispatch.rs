use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::dialog::ConversationBridge;
use crate::error::StoreError;
use crate::metrics::{MESSAGES_TOTAL, RATE_LIMITED};
use crate::models::IncomingText;
use crate::notifier::Notifier;
use crate::rate_limit::RateLimiter;
use crate::registry::UserRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    // Every message went through
    Completed { replied: usize },
    // A sender was over quota; later messages in the batch were not looked at
    RateLimited { sender: String },
}

/// Runs each message of an event through registry, limiter, dialog and notifier,
/// strictly one after another.
pub struct Dispatcher {
    registry: Option<UserRegistry>,
    rate_limiter: Option<RateLimiter>,
    bridge: ConversationBridge,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(bridge: ConversationBridge, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            registry: None,
            rate_limiter: None,
            bridge,
            notifier,
        }
    }

    pub fn with_registry(mut self, registry: UserRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    // Store errors abort the whole batch. A rejected sender also stops the batch,
    // which drops messages from other senders queued behind it.
    pub async fn dispatch(&self, messages: &[IncomingText], now: DateTime<Utc>) -> Result<Outcome, StoreError> {
        let mut replied = 0;

        for message in messages {
            MESSAGES_TOTAL.inc();
            let sender = message.sender.as_str();

            if let Some(registry) = &self.registry {
                registry.ensure_registered(sender, now).await?;
            }

            if let Some(limiter) = &self.rate_limiter {
                if !limiter.admit(sender, now.timestamp()).await? {
                    RATE_LIMITED.inc();
                    return Ok(Outcome::RateLimited { sender: sender.to_string() });
                }
            }

            let reply = self.bridge.get_reply(sender, &message.text).await;

            match self.notifier.send_text(sender, &reply).await {
                Ok(status) => {
                    tracing::info!(sender, status = status.as_u16(), "reply sent");
                    replied += 1;
                }
                Err(e) => tracing::warn!(sender, error = %e, "reply not delivered"),
            }
        }

        Ok(Outcome::Completed { replied })
    }
}
