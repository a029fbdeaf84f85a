mod embeddings;
mod qdrant;

pub use embeddings::{EmbeddingClient, OllamaEmbeddings};
pub use qdrant::QdrantRetriever;

use anyhow::Result;
use async_trait::async_trait;

/// One ranked fragment returned from the vector index.
#[derive(Debug, Clone)]
pub struct DocumentFragment {
    pub text: String,
    pub score: f32,
}

/// Vector similarity search over a pre-built index.
///
/// Index construction is a separate batch job and not covered here; this
/// trait only reads.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return fragments relevant to `query`, best match first.
    async fn retrieve(&self, query: &str) -> Result<Vec<DocumentFragment>>;
}

/// Concatenate fragments into one context blob, ranked order preserved.
/// No re-ranking, no deduplication.
pub fn stitch_context(fragments: &[DocumentFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
