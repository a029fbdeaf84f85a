use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ragchat_llm::{ChatClient, ModelRegistry, OllamaClient, OpenAIClient};
use ragchat_retrieval::{OllamaEmbeddings, QdrantRetriever, Retriever};
use ragchat_server::{build_router, config::Config, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting ragchat server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Model registry (validated: exactly one default entry)
    let registry = ModelRegistry::builtin()?;

    // Inference clients, one per provider in the registry's closed set
    let openai: Arc<dyn ChatClient> = Arc::new(OpenAIClient::new(config.openai_api_key.clone())?);
    let ollama: Arc<dyn ChatClient> = Arc::new(OllamaClient::new(config.llm.ollama_url.clone()));

    // Retrieval over the pre-built vector index
    let embedder = Arc::new(OllamaEmbeddings::new(
        config.llm.ollama_url.clone(),
        config.retrieval.embedding_model.clone(),
    ));
    let retriever: Arc<dyn Retriever> = Arc::new(QdrantRetriever::new(
        config.retrieval.qdrant_url.clone(),
        config.retrieval.collection.clone(),
        config.retrieval.top_k,
        embedder,
    ));

    let state = Arc::new(AppState::new(
        config.clone(),
        registry,
        retriever,
        openai,
        ollama,
    ));

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
