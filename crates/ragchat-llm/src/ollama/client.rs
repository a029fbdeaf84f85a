use crate::streaming::{parse_ollama_chat_stream, StreamEvent};
use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse};
use crate::types::Message;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::Stream;
use serde::Deserialize;
use serde_json::Value;
use std::pin::Pin;

const OLLAMA_DEFAULT_BASE: &str = "http://localhost:11434";

/// Client for a local or remote Ollama server (`/api/chat`).
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn local() -> Self {
        Self::new(OLLAMA_DEFAULT_BASE)
    }

    fn build_chat_request(
        &self,
        model: &str,
        messages: Vec<Message>,
        options: &ChatOptions,
        stream: bool,
    ) -> Value {
        let ollama_messages: Vec<Value> = messages
            .into_iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role(),
                    "content": msg.content().as_text().unwrap_or_default(),
                })
            })
            .collect();

        let mut request = serde_json::json!({
            "model": model,
            "messages": ollama_messages,
            "stream": stream,
        });

        let mut opts = serde_json::Map::new();
        if let Some(temp) = options.temperature {
            opts.insert("temperature".to_string(), serde_json::json!(temp));
        }
        if let Some(max_tokens) = options.max_tokens {
            opts.insert("num_predict".to_string(), serde_json::json!(max_tokens));
        }
        if !opts.is_empty() {
            request
                .as_object_mut()
                .unwrap()
                .insert("options".to_string(), Value::Object(opts));
        }

        request
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload =
            self.build_chat_request(&request.model, request.messages, &request.options, false);

        let response = self
            .http_client
            .post(format!("{}/api/chat", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Ollama request failed with status: {}. Make sure Ollama is running with: ollama serve",
                response.status()
            ));
        }

        let raw_value: Value = response.json().await.context("Failed to parse response")?;
        let parsed: OllamaChatResponse =
            serde_json::from_value(raw_value.clone()).context("Unexpected ollama response shape")?;

        Ok(ChatResponse {
            content: Some(parsed.message.content),
            finish_reason: parsed.done_reason,
            raw: raw_value,
        })
    }

    async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>> {
        let payload =
            self.build_chat_request(&request.model, request.messages, &request.options, true);

        let response = self
            .http_client
            .post(format!("{}/api/chat", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Ollama request failed with status: {}. Make sure Ollama is running with: ollama serve",
                response.status()
            ));
        }

        Ok(parse_ollama_chat_stream(response))
    }
}
