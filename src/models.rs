use serde::{Deserialize, Serialize};
use serde_json::Value;

// Per-sender counter persisted in the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimitRecord {
    pub last_request_time: i64,
    pub request_count: i64,
    pub blocks: i64,
}

// users/{id} document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub phone: String,
    pub registered_at: String,
}

impl UserRecord {
    pub fn new(phone: &str, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            phone: phone.to_string(),
            registered_at: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

// A text message pulled out of an inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingText {
    pub sender: String,
    pub text: String,
}

// GET handshake query
#[derive(Deserialize, Debug, Default)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

// WhatsApp send API body
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OutboundText<'a> {
    pub messaging_product: &'static str,
    pub to: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: OutboundBody<'a>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OutboundBody<'a> {
    pub body: &'a str,
}

impl<'a> OutboundText<'a> {
    pub fn new(to: &'a str, body: &'a str) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: OutboundBody { body },
        }
    }
}

/// Walks `entry[].changes[].value.messages[]` and keeps every message that has a
/// sender and a text body. Anything else is skipped with a warning.
pub fn extract_messages(payload: &Value) -> Vec<IncomingText> {
    let mut found = Vec::new();
    let Some(entries) = payload.get("entry").and_then(Value::as_array) else {
        return found;
    };

    for entry in entries {
        let Some(changes) = entry.get("changes").and_then(Value::as_array) else {
            tracing::warn!("entry without changes, skipping");
            continue;
        };

        for change in changes {
            let Some(value) = change.get("value") else {
                tracing::warn!("change without value, skipping");
                continue;
            };
            // status callbacks carry no messages
            let Some(messages) = value.get("messages").and_then(Value::as_array) else {
                continue;
            };

            for message in messages {
                let sender = message.get("from").and_then(Value::as_str);
                let text = message
                    .get("text")
                    .and_then(|t| t.get("body"))
                    .and_then(Value::as_str);

                match (sender, text) {
                    (Some(sender), Some(text)) if !sender.is_empty() => found.push(IncomingText {
                        sender: sender.to_string(),
                        text: text.to_string(),
                    }),
                    _ => {
                        let kind = message.get("type").and_then(Value::as_str).unwrap_or("unknown");
                        tracing::warn!(kind, "message without sender or text body, skipping");
                    }
                }
            }
        }
    }

    found
}
