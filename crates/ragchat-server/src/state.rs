use crate::config::Config;
use ragchat_llm::{ChatClient, ModelRegistry, Provider};
use ragchat_retrieval::Retriever;
use std::sync::Arc;

/// Shared application state passed to all handlers.
///
/// Everything here is immutable after startup; per-request state lives in
/// the pipeline built for each call.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ModelRegistry>,
    pub retriever: Arc<dyn Retriever>,
    pub openai: Arc<dyn ChatClient>,
    pub ollama: Arc<dyn ChatClient>,
}

impl AppState {
    pub fn new(
        config: Config,
        registry: ModelRegistry,
        retriever: Arc<dyn Retriever>,
        openai: Arc<dyn ChatClient>,
        ollama: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            retriever,
            openai,
            ollama,
        }
    }

    /// Pick the inference client for a resolved provider.
    pub fn client_for(&self, provider: Provider) -> Arc<dyn ChatClient> {
        match provider {
            Provider::OpenAi => Arc::clone(&self.openai),
            Provider::Ollama => Arc::clone(&self.ollama),
        }
    }
}
