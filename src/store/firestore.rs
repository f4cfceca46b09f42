use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::DocumentStore;
use crate::config::FirestoreConfig;
use crate::error::StoreError;
use crate::models::{RateLimitRecord, UserRecord};

pub const RATE_LIMIT_COLLECTION: &str = "rate_limits";
pub const USERS_COLLECTION: &str = "users";

// Firestore REST client (v1 documents API)
pub struct FirestoreStore {
    client: reqwest::Client,
    documents_url: String,
    access_token: String,
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreStore {
    pub fn new(client: reqwest::Client, config: &FirestoreConfig) -> Self {
        Self {
            client,
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                config.base, config.project_id
            ),
            access_token: config.access_token.clone(),
        }
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<String, StoreError> {
        Ok(format!("{}/{}/{}", self.documents_url, collection, document_segment(id)?))
    }

    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let res = self
            .client
            .get(self.document_url(collection, id)?)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(StoreError::Transport)?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = ensure_success(res).await?;
        let doc = res
            .json::<Document>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(doc))
    }

    async fn create(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError> {
        let res = self
            .client
            .post(format!("{}/{}", self.documents_url, collection))
            .query(&[("documentId", id)])
            .bearer_auth(&self.access_token)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(StoreError::Transport)?;
        ensure_success(res).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get_record(&self, sender_id: &str) -> Result<Option<RateLimitRecord>, StoreError> {
        let Some(doc) = self.fetch(RATE_LIMIT_COLLECTION, sender_id).await? else {
            return Ok(None);
        };
        decode_record(&doc.fields).map(Some)
    }

    async fn create_record(&self, sender_id: &str, record: &RateLimitRecord) -> Result<(), StoreError> {
        self.create(RATE_LIMIT_COLLECTION, sender_id, encode_record(record, true))
            .await
    }

    async fn update_record(&self, sender_id: &str, record: &RateLimitRecord) -> Result<(), StoreError> {
        let res = self
            .client
            .patch(self.document_url(RATE_LIMIT_COLLECTION, sender_id)?)
            .query(&[
                ("updateMask.fieldPaths", "last_request_time"),
                ("updateMask.fieldPaths", "request_count"),
            ])
            .bearer_auth(&self.access_token)
            .json(&json!({ "fields": encode_record(record, false) }))
            .send()
            .await
            .map_err(StoreError::Transport)?;
        ensure_success(res).await?;
        Ok(())
    }

    async fn user_exists(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.fetch(USERS_COLLECTION, user_id).await?.is_some())
    }

    async fn create_user(&self, user_id: &str, user: &UserRecord) -> Result<(), StoreError> {
        let fields = json!({
            "phone": { "stringValue": user.phone },
            "registered_at": { "timestampValue": user.registered_at },
        });
        self.create(USERS_COLLECTION, user_id, fields).await
    }
}

// Sender ids come straight from the inbound payload and must stay one path segment
fn document_segment(id: &str) -> Result<String, StoreError> {
    if id.is_empty() || id.chars().all(|c| c == '.') {
        return Err(StoreError::InvalidKey(id.to_string()));
    }
    Ok(urlencoding::encode(id).into_owned())
}

async fn ensure_success(res: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(StoreError::Status { status: status.as_u16(), body })
}

fn integer_value(value: i64) -> Value {
    // Firestore encodes int64 as a decimal string
    json!({ "integerValue": value.to_string() })
}

fn encode_record(record: &RateLimitRecord, with_blocks: bool) -> Value {
    let mut fields = json!({
        "last_request_time": integer_value(record.last_request_time),
        "request_count": integer_value(record.request_count),
    });
    if with_blocks {
        fields["blocks"] = integer_value(record.blocks);
    }
    fields
}

fn decode_record(fields: &Map<String, Value>) -> Result<RateLimitRecord, StoreError> {
    let required = |name: &str| {
        read_integer(fields, name)?
            .ok_or_else(|| StoreError::Decode(format!("missing field {name}")))
    };
    Ok(RateLimitRecord {
        last_request_time: required("last_request_time")?,
        request_count: required("request_count")?,
        blocks: read_integer(fields, "blocks")?.unwrap_or(0),
    })
}

fn read_integer(fields: &Map<String, Value>, name: &str) -> Result<Option<i64>, StoreError> {
    let Some(field) = fields.get(name) else {
        return Ok(None);
    };
    let raw = field
        .get("integerValue")
        .or_else(|| field.get("doubleValue"))
        .ok_or_else(|| StoreError::Decode(format!("field {name} is not numeric")))?;

    let parsed = match raw {
        Value::String(s) => s.parse::<i64>().ok(),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| StoreError::Decode(format!("field {name} has invalid value {raw}")))
}
