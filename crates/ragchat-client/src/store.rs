use crate::message::{ChatMessage, Role};

/// Append-only conversation transcript.
///
/// Ids are assigned as `max(existing) + 1` and never reused. Every mutation
/// fires the change hook so the UI layer can keep the view pinned to the
/// bottom.
#[derive(Default)]
pub struct ConversationStore {
    messages: Vec<ChatMessage>,
    on_change: Option<Box<dyn Fn(&ChatMessage) + Send>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook fired after every append/update.
    pub fn set_on_change(&mut self, hook: impl Fn(&ChatMessage) + Send + 'static) {
        self.on_change = Some(Box::new(hook));
    }

    /// Append a message and return its assigned id.
    pub fn append(
        &mut self,
        role: Role,
        model_id: Option<String>,
        text: impl Into<String>,
        streaming: bool,
    ) -> u64 {
        let id = self.messages.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        let message = ChatMessage {
            id,
            role,
            model_id,
            text: text.into(),
            streaming,
        };
        self.messages.push(message);
        self.notify_last();
        id
    }

    /// Mutate one message in place, keyed by id. Position and id are
    /// preserved; all other messages stay untouched. Returns false when the
    /// id does not exist.
    pub fn update_by_id(&mut self, id: u64, mutate: impl FnOnce(&mut ChatMessage)) -> bool {
        let Some(index) = self.messages.iter().position(|m| m.id == id) else {
            return false;
        };
        mutate(&mut self.messages[index]);
        if let Some(hook) = &self.on_change {
            hook(&self.messages[index]);
        }
        true
    }

    /// Submit a question: append the user entry plus a pending assistant
    /// entry and return the pending id. Rejected with `None` while another
    /// turn is still streaming, leaving the transcript untouched.
    pub fn begin_turn(&mut self, question: impl Into<String>, model_id: &str) -> Option<u64> {
        if self.has_streaming() {
            return None;
        }
        self.append(Role::User, None, question, false);
        Some(self.append(Role::Assistant, Some(model_id.to_string()), "", true))
    }

    pub fn all(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Gate for the single-in-flight-turn invariant: a new turn must not
    /// start while this returns true.
    pub fn has_streaming(&self) -> bool {
        self.messages.iter().any(|m| m.streaming)
    }

    fn notify_last(&self) {
        if let (Some(hook), Some(message)) = (&self.on_change, self.messages.last()) {
            hook(message);
        }
    }
}
