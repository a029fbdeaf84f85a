use ragchat_llm::Message;
use uuid::Uuid;

/// One pipeline invocation's conversational identity.
///
/// A fresh thread is minted per backend call; it lives only as long as the
/// call. Clients that want cross-turn memory keep the transcript themselves.
#[derive(Debug, Clone)]
pub struct ThreadState {
    thread_id: Uuid,
    history: Vec<Message>,
}

impl ThreadState {
    pub fn new() -> Self {
        Self {
            thread_id: Uuid::now_v7(),
            history: Vec::new(),
        }
    }

    /// Start a thread with prior turns already in place.
    pub fn with_history(history: Vec<Message>) -> Self {
        Self {
            thread_id: Uuid::now_v7(),
            history,
        }
    }

    pub fn thread_id(&self) -> Uuid {
        self.thread_id
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Append the finished turn: one user entry and one assistant entry,
    /// added together after the stream ends. The history used for future
    /// rewriting is the final text, never a partial.
    pub fn record_turn(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.history.push(Message::human(question.into()));
        self.history.push(Message::ai(answer.into()));
    }
}

impl Default for ThreadState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_thread_has_empty_history() {
        let thread = ThreadState::new();
        assert!(thread.history().is_empty());
    }

    #[test]
    fn record_turn_appends_user_then_assistant() {
        let mut thread = ThreadState::new();
        thread.record_turn("question", "answer");

        assert_eq!(thread.history().len(), 2);
        assert_eq!(thread.history()[0].role(), "user");
        assert_eq!(thread.history()[1].role(), "assistant");
    }

    #[test]
    fn thread_ids_are_unique_per_invocation() {
        assert_ne!(ThreadState::new().thread_id(), ThreadState::new().thread_id());
    }
}
