use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::config::DialogflowConfig;
use crate::error::DialogError;
use crate::metrics::DIALOG_FAILURES;

pub const LANGUAGE_CODE: &str = "pt-BR";
pub const ERROR_FALLBACK: &str = "Erro ao processar a resposta";
pub const NOT_UNDERSTOOD_FALLBACK: &str = "Não entendi sua mensagem.";

// One entry of queryResult.responseMessages
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMessage {
    #[serde(default)]
    pub text: Option<TextSegments>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSegments {
    #[serde(default)]
    pub text: Vec<String>,
}

impl ResponseMessage {
    pub fn text(body: &str) -> Self {
        Self {
            text: Some(TextSegments { text: vec![body.to_string()] }),
        }
    }
}

/// Session-scoped intent detection. Multi-turn context lives on the service side.
#[async_trait]
pub trait DialogService: Send + Sync {
    async fn detect_intent(&self, session_id: &str, text: &str) -> Result<Vec<ResponseMessage>, DialogError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentResponse {
    #[serde(default)]
    query_result: Option<QueryResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    #[serde(default)]
    response_messages: Vec<ResponseMessage>,
}

// Dialogflow CX over REST
pub struct DialogflowCx {
    client: reqwest::Client,
    agent_url: String,
    access_token: Option<String>,
}

impl DialogflowCx {
    pub fn new(client: reqwest::Client, config: &DialogflowConfig) -> Self {
        Self {
            client,
            agent_url: format!(
                "{}/v3/projects/{}/locations/{}/agents/{}",
                config.endpoint, config.project, config.location, config.agent_id
            ),
            access_token: config.access_token.clone(),
        }
    }

    fn session_url(&self, session_id: &str) -> String {
        format!(
            "{}/sessions/{}:detectIntent",
            self.agent_url,
            urlencoding::encode(session_id)
        )
    }
}

#[async_trait]
impl DialogService for DialogflowCx {
    async fn detect_intent(&self, session_id: &str, text: &str) -> Result<Vec<ResponseMessage>, DialogError> {
        let body = json!({
            "queryInput": {
                "text": { "text": text },
                "languageCode": LANGUAGE_CODE,
            }
        });

        let mut req = self.client.post(self.session_url(session_id)).json(&body);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        let res = req.send().await.map_err(DialogError::DependencyUnavailable)?;
        if !res.status().is_success() {
            return Err(DialogError::Status(res.status().as_u16()));
        }

        let parsed = res
            .json::<DetectIntentResponse>()
            .await
            .map_err(|e| DialogError::Decode(e.to_string()))?;
        Ok(parsed.query_result.map(|q| q.response_messages).unwrap_or_default())
    }
}

// First text of the first segment, or the "did not understand" text
pub fn reply_text(messages: &[ResponseMessage]) -> String {
    messages
        .first()
        .and_then(|m| m.text.as_ref())
        .and_then(|t| t.text.first())
        .filter(|t| !t.is_empty())
        .cloned()
        .unwrap_or_else(|| NOT_UNDERSTOOD_FALLBACK.to_string())
}

/// Turns a user's message into the text we answer with. Never fails: service
/// errors collapse into [`ERROR_FALLBACK`].
pub struct ConversationBridge {
    service: Arc<dyn DialogService>,
}

impl ConversationBridge {
    pub fn new(service: Arc<dyn DialogService>) -> Self {
        Self { service }
    }

    pub async fn get_reply(&self, session_id: &str, text: &str) -> String {
        match self.service.detect_intent(session_id, text).await {
            Ok(messages) => reply_text(&messages),
            Err(e) => {
                DIALOG_FAILURES.inc();
                tracing::warn!(sender = session_id, error = %e, "dialog service failed, using fallback reply");
                ERROR_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Canned(Result<Vec<ResponseMessage>, u16>);

    #[async_trait]
    impl DialogService for Canned {
        async fn detect_intent(&self, _: &str, _: &str) -> Result<Vec<ResponseMessage>, DialogError> {
            self.0.clone().map_err(DialogError::Status)
        }
    }

    fn bridge(result: Result<Vec<ResponseMessage>, u16>) -> ConversationBridge {
        ConversationBridge::new(Arc::new(Canned(result)))
    }

    fn cx_for(server: &MockServer, token: Option<&str>) -> DialogflowCx {
        DialogflowCx::new(
            reqwest::Client::new(),
            &DialogflowConfig {
                endpoint: server.uri(),
                project: "proj".to_string(),
                location: "global".to_string(),
                agent_id: "agent-1".to_string(),
                access_token: token.map(str::to_string),
            },
        )
    }

    #[tokio::test]
    async fn returns_first_text_of_first_segment() {
        let reply = bridge(Ok(vec![
            ResponseMessage { text: Some(TextSegments { text: vec!["Olá!".into(), "extra".into()] }) },
            ResponseMessage::text("ignored"),
        ]))
        .get_reply("5511", "oi")
        .await;
        assert_eq!(reply, "Olá!");
    }

    #[tokio::test]
    async fn service_error_becomes_error_fallback() {
        assert_eq!(bridge(Err(500)).get_reply("5511", "oi").await, ERROR_FALLBACK);
    }

    #[tokio::test]
    async fn empty_responses_become_not_understood() {
        assert_eq!(bridge(Ok(vec![])).get_reply("5511", "oi").await, NOT_UNDERSTOOD_FALLBACK);
        assert_eq!(
            bridge(Ok(vec![ResponseMessage::default()])).get_reply("5511", "oi").await,
            NOT_UNDERSTOOD_FALLBACK
        );
        assert_eq!(
            bridge(Ok(vec![ResponseMessage { text: Some(TextSegments::default()) }]))
                .get_reply("5511", "oi")
                .await,
            NOT_UNDERSTOOD_FALLBACK
        );
    }

    #[tokio::test]
    async fn detect_intent_posts_session_scoped_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/projects/proj/locations/global/agents/agent-1/sessions/5511:detectIntent"))
            .and(header("authorization", "Bearer df-token"))
            .and(body_json(json!({
                "queryInput": {"text": {"text": "oi"}, "languageCode": "pt-BR"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseId": "r1",
                "queryResult": {
                    "text": "oi",
                    "responseMessages": [{"text": {"text": ["Olá!"]}}, {"payload": {}}]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let messages = cx_for(&server, Some("df-token")).detect_intent("5511", "oi").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(reply_text(&messages), "Olá!");
    }

    #[tokio::test]
    async fn session_id_is_escaped_into_one_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/projects/proj/locations/global/agents/agent-1/sessions/..%2F..%2Fother:detectIntent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "queryResult": {"responseMessages": [{"text": {"text": ["ok"]}}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let messages = cx_for(&server, None).detect_intent("../../other", "oi").await.unwrap();
        assert_eq!(reply_text(&messages), "ok");
    }

    #[tokio::test]
    async fn missing_query_result_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responseId": "r1"})))
            .mount(&server)
            .await;

        let messages = cx_for(&server, None).detect_intent("5511", "oi").await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = cx_for(&server, None).detect_intent("5511", "oi").await.unwrap_err();
        assert!(matches!(err, DialogError::Status(503)));
    }

    #[tokio::test]
    async fn unreachable_service_is_dependency_unavailable() {
        let cx = DialogflowCx::new(
            reqwest::Client::new(),
            &DialogflowConfig {
                endpoint: "http://127.0.0.1:1".to_string(),
                project: "p".to_string(),
                location: "global".to_string(),
                agent_id: "a".to_string(),
                access_token: None,
            },
        );
        let err = cx.detect_intent("5511", "oi").await.unwrap_err();
        assert!(matches!(err, DialogError::DependencyUnavailable(_)));
    }
}
