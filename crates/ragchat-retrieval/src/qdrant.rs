use crate::{DocumentFragment, EmbeddingClient, Retriever};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

/// Retriever backed by a Qdrant collection, queried over its HTTP API.
///
/// The query text is embedded first, then matched against the collection;
/// fragments come back best score first with their payload text.
pub struct QdrantRetriever {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    top_k: usize,
    embedder: Arc<dyn EmbeddingClient>,
}

impl QdrantRetriever {
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        top_k: usize,
        embedder: Arc<dyn EmbeddingClient>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            collection: collection.into(),
            top_k,
            embedder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchRes {
    result: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    score: f32,
    #[serde(default)]
    payload: Option<SearchPayload>,
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl Retriever for QdrantRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<DocumentFragment>> {
        debug!(?query, top_k = self.top_k, "retrieve fragments");
        let vector = self.embedder.embed(query).await?;

        let qbody = json!({
            "vector": vector,
            "limit": self.top_k,
            "with_payload": true,
        });
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let resp = self
            .client
            .post(url)
            .json(&qbody)
            .send()
            .await
            .context("qdrant search failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(status = %status, %body, "qdrant search error");
            return Err(anyhow!("qdrant search error: {}", body));
        }

        let parsed: SearchRes = resp.json().await.context("parse search result")?;
        let fragments = parsed
            .result
            .into_iter()
            .filter_map(|item| {
                item.payload
                    .and_then(|p| p.text)
                    .map(|text| DocumentFragment {
                        text,
                        score: item.score,
                    })
            })
            .collect();

        Ok(fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_result_parses_payload_text() {
        let body = r#"{
            "result": [
                { "id": "1", "score": 0.91, "payload": { "text": "Paris is the capital of France." } },
                { "id": "2", "score": 0.42, "payload": {} }
            ]
        }"#;
        let parsed: SearchRes = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.result.len(), 2);
        assert_eq!(
            parsed.result[0].payload.as_ref().unwrap().text.as_deref(),
            Some("Paris is the capital of France.")
        );
        assert!(parsed.result[1].payload.as_ref().unwrap().text.is_none());
    }
}
