pub mod message;
pub mod store;
pub mod transport;

pub use message::{ChatMessage, Role};
pub use store::ConversationStore;
pub use transport::ChatTransport;
