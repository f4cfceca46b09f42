use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::Config;
use crate::error::NotifyError;
use crate::metrics::NOTIFICATIONS_SENT;
use crate::models::OutboundText;

/// Delivers a reply to the messaging platform. The returned status is whatever the
/// platform answered; non-2xx is not turned into an error.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<StatusCode, NotifyError>;
}

// WhatsApp Cloud API send endpoint
pub struct WhatsAppNotifier {
    client: reqwest::Client,
    messages_url: String,
    access_token: String,
}

impl WhatsAppNotifier {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            messages_url: format!("{}/{}/messages", config.graph_api_base, config.phone_number_id),
            access_token: config.access_token.clone(),
        }
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<StatusCode, NotifyError> {
        let res = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.access_token)
            .json(&OutboundText::new(recipient_id, text))
            .send()
            .await
            .map_err(NotifyError::Transport)?;

        let status = res.status();
        NOTIFICATIONS_SENT.with_label_values(&[status.as_str()]).inc();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(recipient = recipient_id, status = status.as_u16(), body = %body, "send API rejected reply");
        }
        Ok(status)
    }
}
