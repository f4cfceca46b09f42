//! Full wiring from `Config`, with Firestore, Dialogflow and the WhatsApp send
//! API all served by one mock server.

use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wa_dialog_gateway::config::{Config, DialogflowConfig, FirestoreConfig};
use wa_dialog_gateway::router::build_router;
use wa_dialog_gateway::state::AppState;

const DOCS: &str = "/projects/fs-proj/databases/(default)/documents";

fn config_for(server: &MockServer) -> Config {
    Config {
        port: 0,
        access_token: "wa-token".to_string(),
        verification_token: "verify-me".to_string(),
        phone_number_id: "1234".to_string(),
        app_secret: None,
        graph_api_base: format!("{}/v22.0", server.uri()),
        dialogflow: DialogflowConfig {
            endpoint: server.uri(),
            project: "df-proj".to_string(),
            location: "global".to_string(),
            agent_id: "agent".to_string(),
            access_token: Some("df-token".to_string()),
        },
        firestore: Some(FirestoreConfig {
            base: server.uri(),
            project_id: "fs-proj".to_string(),
            access_token: "fs-token".to_string(),
        }),
        register_users: true,
        rate_limit_enabled: true,
    }
}

async fn serve(config: &Config) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(Arc::new(AppState::from_config(config)));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn one_message(from: &str, text: &str) -> Value {
    json!({"entry": [{"changes": [{"value": {"messages": [{"from": from, "text": {"body": text}}]}}]}]})
}

#[tokio::test]
async fn first_message_registers_counts_and_replies() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DOCS}/users/5511999999999")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}/users")))
        .and(query_param("documentId", "5511999999999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCS}/rate_limits/5511999999999")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}/rate_limits")))
        .and(body_partial_json(json!({"fields": {"request_count": {"integerValue": "1"}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/projects/df-proj/locations/global/agents/agent/sessions/5511999999999:detectIntent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "queryResult": {"responseMessages": [{"text": {"text": ["Olá!"]}}]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v22.0/1234/messages"))
        .and(body_partial_json(json!({"to": "5511999999999", "text": {"body": "Olá!"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": [{"id": "wamid.1"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let base = serve(&config_for(&server)).await;
    let res = reqwest::Client::new()
        .post(format!("{base}/webhook"))
        .json(&one_message("5511999999999", "oi"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"status": "ok"}));
}

#[tokio::test]
async fn store_failure_fails_the_request_without_replying() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v22.0/1234/messages"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let base = serve(&config_for(&server)).await;
    let res = reqwest::Client::new()
        .post(format!("{base}/webhook"))
        .json(&one_message("5521", "oi"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"error": "internal error"}));
}

#[tokio::test]
async fn metrics_are_exposed() {
    let server = MockServer::start().await;
    let base = serve(&config_for(&server)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/webhook"))
        .json(&json!({"object": "whatsapp_business_account", "entry": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let text = client.get(format!("{base}/metrics")).send().await.unwrap().text().await.unwrap();
    assert!(text.contains("webhook_request_latency_seconds_count"));
}
