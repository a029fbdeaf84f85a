use ragchat_llm::streaming::{ChatStreamChunk, OllamaStreamChunk};
use ragchat_llm::StreamEvent;

#[test]
fn test_stream_event_message() {
    let event = StreamEvent::Message {
        content: "Hello".to_string(),
    };

    match event {
        StreamEvent::Message { content } => assert_eq!(content, "Hello"),
        _ => panic!("Expected Message variant"),
    }
}

#[test]
fn test_stream_event_done() {
    let event = StreamEvent::Done {
        finish_reason: Some("stop".to_string()),
    };

    match event {
        StreamEvent::Done { finish_reason } => {
            assert_eq!(finish_reason, Some("stop".to_string()));
        }
        _ => panic!("Expected Done variant"),
    }
}

#[test]
fn test_stream_event_serialization() {
    let event = StreamEvent::Message {
        content: "Test".to_string(),
    };

    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"message\""));
    assert!(json.contains("Test"));
}

#[test]
fn test_chat_chunk_content() {
    let json = r#"{
        "id": "chatcmpl-1",
        "object": "chat.completion.chunk",
        "created": 1700000000,
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "delta": { "role": "assistant", "content": "Hel" },
            "finish_reason": null
        }]
    }"#;

    let chunk: ChatStreamChunk = serde_json::from_str(json).unwrap();
    assert_eq!(chunk.content(), Some("Hel"));
    assert!(!chunk.is_done());
}

#[test]
fn test_chat_chunk_done() {
    let json = r#"{
        "id": "chatcmpl-1",
        "object": "chat.completion.chunk",
        "created": 1700000000,
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "delta": { "role": null, "content": null },
            "finish_reason": "stop"
        }]
    }"#;

    let chunk: ChatStreamChunk = serde_json::from_str(json).unwrap();
    assert!(chunk.is_done());
}

#[test]
fn test_ollama_chunk_fragment() {
    let json = r#"{"model":"llama3.2:3b","message":{"role":"assistant","content":"lo, "},"done":false}"#;
    let chunk: OllamaStreamChunk = serde_json::from_str(json).unwrap();
    assert_eq!(chunk.message.unwrap().content, "lo, ");
    assert!(!chunk.done);
}

#[test]
fn test_ollama_chunk_done() {
    let json = r#"{"model":"llama3.2:3b","message":{"role":"assistant","content":""},"done":true,"done_reason":"stop"}"#;
    let chunk: OllamaStreamChunk = serde_json::from_str(json).unwrap();
    assert!(chunk.done);
    assert_eq!(chunk.done_reason.as_deref(), Some("stop"));
}
