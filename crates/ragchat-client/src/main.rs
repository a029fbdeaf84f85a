use anyhow::Result;
use futures::StreamExt;
use ragchat_client::{ChatTransport, ConversationStore, Role};
use serde::Deserialize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
    #[allow(dead_code)]
    name: String,
    selected: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let base = std::env::var("RAGCHAT_API_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());

    // One session per client start, stable across turns.
    let session_id = Uuid::now_v7().to_string();
    let transport = ChatTransport::new(format!("{}/api/chat", base));

    let model = match std::env::args().nth(1) {
        Some(model) => model,
        None => fetch_default_model(&base).await,
    };

    let mut store = ConversationStore::new();

    println!("ragchat — model {} (session {})", model, session_id);
    println!("type a question, /quit to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        // Input is consumed on every path from here on.
        let question = line.trim().to_string();
        if question.is_empty() {
            continue;
        }
        if question == "/quit" {
            break;
        }

        // The sequential loop already guarantees one turn in flight; the
        // store rejects a submission while an answer is still streaming.
        let Some(pending) = store.begin_turn(question.clone(), &model) else {
            continue;
        };

        match transport.post_turn(&question, &model, &session_id).await {
            Ok(mut stream) => {
                while let Some(chunk) = stream.next().await {
                    match chunk {
                        Ok(text) => {
                            print!("{}", text);
                            std::io::stdout().flush()?;
                            store.update_by_id(pending, |m| m.text.push_str(&text));
                        }
                        Err(e) => {
                            store.append(Role::System, None, format!("Error: {}", e), false);
                            eprintln!("\nError: {}", e);
                            break;
                        }
                    }
                }
                store.update_by_id(pending, |m| m.streaming = false);
            }
            Err(e) => {
                store.update_by_id(pending, |m| m.streaming = false);
                store.append(Role::System, None, format!("Error: {}", e), false);
                eprintln!("Error: {}", e);
            }
        }
    }

    Ok(())
}

/// Ask the server which model the registry marks as default; fall back to a
/// known id when the server is unreachable.
async fn fetch_default_model(base: &str) -> String {
    let models: Vec<ModelEntry> = match reqwest::get(format!("{}/api/models", base)).await {
        Ok(response) => response.json().await.unwrap_or_default(),
        Err(_) => Vec::new(),
    };

    models
        .into_iter()
        .find(|m| m.selected)
        .map(|m| m.id)
        .unwrap_or_else(|| "llama32-3b".to_string())
}
