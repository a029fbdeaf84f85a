use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Client-side notices (transport failures and the like)
    System,
}

/// One transcript entry. `text` grows in place while `streaming` is true and
/// is frozen once the stream ends; entries are never removed.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    /// Which model produced this entry; assistant messages only.
    pub model_id: Option<String>,
    pub text: String,
    pub streaming: bool,
}
