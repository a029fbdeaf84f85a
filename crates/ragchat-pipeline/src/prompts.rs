use ragchat_llm::Message;

/// Fixed instruction for the answering call. `{context}` is replaced with the
/// stitched retrieval result.
pub(crate) const QA_SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks.
Use the following pieces of retrieved context to answer the question.
If you don't know the answer, say that you don't know.
Use three sentences maximum and keep the answer concise.

{context}";

/// Instruction for the standalone-question rewrite over prior history.
pub(crate) const REPHRASE_PROMPT: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, formulate a standalone question which can \
be understood without the chat history. Do NOT answer the question, just reformulate it if \
needed and otherwise return it as is.";

/// Build the answering prompt: system instruction with context, prior turns
/// role-tagged, then the current question.
pub(crate) fn qa_messages(context: &str, history: &[Message], question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(
        QA_SYSTEM_PROMPT.replace("{context}", context),
    ));
    messages.extend_from_slice(history);
    messages.push(Message::human(question));
    messages
}

/// Build the rewrite prompt: prior turns, the question, then the rephrase
/// instruction.
pub(crate) fn rephrase_messages(history: &[Message], question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.extend_from_slice(history);
    messages.push(Message::human(question));
    messages.push(Message::system(REPHRASE_PROMPT));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qa_messages_order() {
        let history = vec![Message::human("q1"), Message::ai("a1")];
        let messages = qa_messages("some context", &history, "q2");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role(), "system");
        assert!(messages[0]
            .content()
            .as_text()
            .unwrap()
            .contains("some context"));
        assert_eq!(messages[1].role(), "user");
        assert_eq!(messages[2].role(), "assistant");
        assert_eq!(messages[3].role(), "user");
        assert_eq!(messages[3].content().as_text(), Some("q2"));
    }

    #[test]
    fn rephrase_messages_end_with_instruction() {
        let history = vec![Message::human("q1"), Message::ai("a1")];
        let messages = rephrase_messages(&history, "what about it?");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[3].role(), "system");
        assert_eq!(messages[3].content().as_text(), Some(REPHRASE_PROMPT));
    }
}
