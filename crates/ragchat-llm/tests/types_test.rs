use ragchat_llm::{Content, Message};

#[test]
fn test_message_roles() {
    assert_eq!(Message::system("a").role(), "system");
    assert_eq!(Message::human("b").role(), "user");
    assert_eq!(Message::ai("c").role(), "assistant");
}

#[test]
fn test_message_serialization_roles() {
    let human = Message::human("What is the capital of France?");
    let json = serde_json::to_string(&human).unwrap();
    assert!(json.contains("\"role\":\"user\""));

    let ai = Message::ai("Paris.");
    let json = serde_json::to_string(&ai).unwrap();
    assert!(json.contains("\"role\":\"assistant\""));
}

#[test]
fn test_content_text() {
    let content = Content::text("hello");
    assert_eq!(content.as_text(), Some("hello"));
}

#[test]
fn test_content_from_str() {
    let content: Content = "hello".into();
    assert_eq!(content.as_text(), Some("hello"));
}

#[test]
fn test_message_content_accessor() {
    let msg = Message::human("question");
    assert_eq!(msg.content().as_text(), Some("question"));
}
