pub mod types;
pub mod traits;
pub mod streaming;
pub mod registry;
pub mod openai;
pub mod ollama;

pub use traits::{ChatClient, ChatRequest, ChatResponse, ChatOptions};
pub use streaming::StreamEvent;
pub use registry::{ModelDescriptor, ModelRegistry, Provider};
pub use openai::OpenAIClient;
pub use ollama::OllamaClient;
pub use types::{Content, Message};
