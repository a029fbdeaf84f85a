/// Events emitted by one chat-turn run, in emission order.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// One generated fragment, forwarded as it arrives.
    Token { content: String },

    /// Terminal success event carrying the full accumulated answer.
    Done { answer: String },

    /// Terminal failure event. The channel closes normally afterwards;
    /// callers never observe a protocol-level error.
    Error { message: String },
}
