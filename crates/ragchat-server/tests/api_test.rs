use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use futures::Stream;
use ragchat_llm::{ChatClient, ChatRequest, ChatResponse, ModelRegistry, StreamEvent};
use ragchat_retrieval::{DocumentFragment, Retriever};
use ragchat_server::{build_router, config::Config, state::AppState};
use std::pin::Pin;
use std::sync::Arc;
use tower::ServiceExt;

struct FakeChatClient {
    fragments: Vec<String>,
    fail_after: Option<usize>,
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse> {
        Ok(ChatResponse {
            content: None,
            finish_reason: Some("stop".to_string()),
            raw: serde_json::Value::Null,
        })
    }

    async fn chat_stream(
        &self,
        _request: ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>> {
        let mut items: Vec<Result<StreamEvent>> = Vec::new();
        match self.fail_after {
            Some(n) => {
                for fragment in self.fragments.iter().take(n) {
                    items.push(Ok(StreamEvent::Message {
                        content: fragment.clone(),
                    }));
                }
                items.push(Err(anyhow::anyhow!("upstream quota exceeded")));
            }
            None => {
                for fragment in &self.fragments {
                    items.push(Ok(StreamEvent::Message {
                        content: fragment.clone(),
                    }));
                }
                items.push(Ok(StreamEvent::Done {
                    finish_reason: Some("stop".to_string()),
                }));
            }
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

struct FakeRetriever;

#[async_trait]
impl Retriever for FakeRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<DocumentFragment>> {
        Ok(vec![DocumentFragment {
            text: "Paris is the capital of France.".to_string(),
            score: 0.9,
        }])
    }
}

fn test_config() -> Config {
    toml::from_str(
        r#"
        [server]
        host = "127.0.0.1"
        port = 0

        [cors]
        enabled = false
        origins = []

        [retrieval]
        qdrant_url = "http://localhost:6333"
        collection = "documents"
        top_k = 4
        embedding_model = "nomic-embed-text"

        [llm]
        ollama_url = "http://localhost:11434"

        [logging]
        level = "debug"
        format = "pretty"
        "#,
    )
    .unwrap()
}

fn test_app(fragments: &[&str], fail_after: Option<usize>) -> axum::Router {
    let client = Arc::new(FakeChatClient {
        fragments: fragments.iter().map(|s| s.to_string()).collect(),
        fail_after,
    });
    let state = Arc::new(AppState::new(
        test_config(),
        ModelRegistry::builtin().unwrap(),
        Arc::new(FakeRetriever),
        Arc::clone(&client) as Arc<dyn ChatClient>,
        client,
    ));
    build_router(state)
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_check_works() {
    let app = test_app(&[], None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn models_route_lists_registry() {
    let app = test_app(&[], None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/models")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let models: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let ids: Vec<&str> = models
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"llama32-3b"));
    assert!(ids.contains(&"gpt-4o"));
}

#[tokio::test]
async fn empty_question_is_rejected_with_400() {
    let app = test_app(&["unused"], None);
    let response = app
        .oneshot(chat_request(
            r#"{"question":"   ","model":"llama32-3b","sessionId":"s-1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_session_id_is_rejected_with_400() {
    let app = test_app(&["unused"], None);
    let response = app
        .oneshot(chat_request(
            r#"{"question":"hello","model":"llama32-3b","sessionId":""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_turn_streams_fragments_with_trailing_newline() {
    let app = test_app(&["Hel", "lo, ", "world"], None);
    let response = app
        .oneshot(chat_request(
            r#"{"question":"greet me","model":"llama32-3b","sessionId":"s-1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"Hello, world\n");
}

#[tokio::test]
async fn unknown_model_falls_back_instead_of_failing() {
    let app = test_app(&["ok"], None);
    let response = app
        .oneshot(chat_request(
            r#"{"question":"hello","model":"unknown-id","sessionId":"s-1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"ok\n");
}

#[tokio::test]
async fn upstream_failure_keeps_prefix_and_appends_error_line() {
    let app = test_app(&["Par", "is"], Some(1));
    let response = app
        .oneshot(chat_request(
            r#"{"question":"capital?","model":"llama32-3b","sessionId":"s-1"}"#,
        ))
        .await
        .unwrap();

    // The stream opened successfully; the failure only shows in the payload.
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("Par"));
    assert!(text.contains("Error: upstream quota exceeded"));
    assert!(text.ends_with('\n'));
}
