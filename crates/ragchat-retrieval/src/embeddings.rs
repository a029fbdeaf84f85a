use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Turns text into a vector for similarity search.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embeddings via the Ollama `/api/embeddings` endpoint.
pub struct OllamaEmbeddings {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbeddings {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingClient for OllamaEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let payload = json!({
            "model": self.model,
            "prompt": text,
        });

        tracing::debug!(url = %url, model = %self.model, "embedding query");
        let resp = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .context("embedding request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("embedding error ({}): {}", status, body));
        }

        let parsed: EmbeddingResponse = resp.json().await.context("parse embedding response")?;
        Ok(parsed.embedding)
    }
}
