use axum::body::Body;
use axum::http::{ Request, StatusCode };
use axum::Router;
use f9_assistant::agent::ChatProxy;
use f9_assistant::config::prompt::{ PromptConfig, FORMAT_APOLOGY, OFF_TOPIC_REDIRECT, TOPIC_REMINDER };
use f9_assistant::llm::chat::new_client;
use f9_assistant::llm::LlmConfig;
use f9_assistant::server::api::{ build_router, AppState };
use f9_assistant::voice::{ VapiClient, VoiceConfig };
use http_body_util::BodyExt;
use serde_json::{ json, Value };
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{ body_partial_json, header, method, path };
use wiremock::{ Mock, MockServer, ResponseTemplate };

const COMPLETIONS: &str = "/api/v1/chat/completions";

fn proxy_for(base: &str) -> ChatProxy {
    let config = LlmConfig {
        api_key: Some("test-key".to_string()),
        base_url: Some(format!("{}{}", base, COMPLETIONS)),
        ..LlmConfig::default()
    };
    let client = new_client(&config).unwrap();
    ChatProxy::new(Some(client), Arc::new(PromptConfig::default()))
}

fn app(proxy: ChatProxy) -> Router {
    let voice = VapiClient::new(VoiceConfig {
        api_key: None,
        base_url: "http://127.0.0.1:1".to_string(),
        phone_number_id: None,
        assistant_id: None,
        timeout: None,
    })
    .unwrap();
    build_router(AppState { proxy: Arc::new(proxy), voice: Arc::new(voice) })
}

async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chatbot")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn hello() -> Value {
    json!({ "messages": [
        { "role": "system", "content": "Be helpful." },
        { "role": "user", "content": "Hello" }
    ]})
}

#[tokio::test]
async fn forwards_conversation_and_returns_normalized_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .and(header("authorization", "Bearer test-key"))
        .and(header("http-referer", "http://localhost:3000"))
        .and(header("x-title", "F9 Productions Chatbot"))
        .and(body_partial_json(json!({
            "model": "mistralai/mistral-7b-instruct",
            "temperature": 0.6,
            "max_tokens": 1000,
            "top_p": 0.9,
            "stop_sequences": ["I apologize, but I cannot", "I'm sorry, but I cannot", "Sorry, I cannot"],
            "messages": [
                { "role": "system", "content": format!("Be helpful.{}", TOPIC_REMINDER) },
                { "role": "user", "content": "Hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Hi there!" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = post_chat(app(proxy_for(&server.uri())), hello()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "content": "Hi there!" }));
}

#[tokio::test]
async fn non_array_messages_are_rejected_before_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for bad in [json!({ "messages": "Hello" }), json!({}), json!({ "messages": { "role": "user" } })] {
        let (status, body) = post_chat(app(proxy_for(&server.uri())), bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request format");
    }
}

#[tokio::test]
async fn missing_api_key_is_a_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let proxy = ChatProxy::new(None, Arc::new(PromptConfig::default()));
    let (status, body) = post_chat(app(proxy), hello()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "OpenRouter API key is not configured");
}

#[tokio::test]
async fn upstream_failure_status_is_a_generic_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "error": { "message": "overloaded" } })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = post_chat(app(proxy_for(&server.uri())), hello()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error communicating with OpenRouter");
    assert!(!body.to_string().contains("overloaded"));
}

#[tokio::test]
async fn unreachable_upstream_is_a_500() {
    let (status, body) = post_chat(app(proxy_for("http://127.0.0.1:1")), hello()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error communicating with OpenRouter");
}

#[tokio::test]
async fn slow_upstream_hits_the_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({ "choices": [{ "message": { "content": "too late" } }] }))
        )
        .mount(&server)
        .await;

    let config = LlmConfig {
        api_key: Some("test-key".to_string()),
        base_url: Some(format!("{}{}", server.uri(), COMPLETIONS)),
        timeout: Some(Duration::from_millis(200)),
        ..LlmConfig::default()
    };
    let proxy = ChatProxy::new(Some(new_client(&config).unwrap()), Arc::new(PromptConfig::default()));

    let (status, body) = post_chat(app(proxy), hello()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error communicating with OpenRouter");
    assert_eq!(body["message"], "Provider could not be reached");
}

#[tokio::test]
async fn undecodable_upstream_body_degrades_to_apology() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let (status, body) = post_chat(app(proxy_for(&server.uri())), hello()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], FORMAT_APOLOGY);
}

#[tokio::test]
async fn alternate_shapes_and_refusals_are_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "text": "I cannot provide information about that." }]
        })))
        .mount(&server)
        .await;

    let (status, body) = post_chat(app(proxy_for(&server.uri())), hello()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], OFF_TOPIC_REDIRECT);
}

#[tokio::test]
async fn generated_text_payloads_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generated_text": "We design **custom homes** across Colorado."
        })))
        .mount(&server)
        .await;

    let (_, body) = post_chat(app(proxy_for(&server.uri())), hello()).await;
    assert_eq!(body["content"], "We design **custom homes** across Colorado.");
}

#[tokio::test]
async fn health_reports_configuration() {
    let proxy = ChatProxy::new(None, Arc::new(PromptConfig::default()));
    let response = app(proxy)
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok", "chat_configured": false }));
}
