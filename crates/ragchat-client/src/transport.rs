use anyhow::{anyhow, Context, Result};
use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::pin::Pin;

/// Integrity checksum header of the existing deployment; a plain SHA-256 of
/// the serialized body, not authentication.
const CHECKSUM_HEADER: &str = "x-amz-content-sha256";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TurnBody<'a> {
    question: &'a str,
    model: &'a str,
    session_id: &'a str,
}

/// Streaming transport to the chat endpoint.
///
/// One operation: post a turn, get back a lazy, forward-only sequence of text
/// chunks that is decoded and yielded as it arrives.
pub struct ChatTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl ChatTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub async fn post_turn(
        &self,
        question: &str,
        model_id: &str,
        session_id: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<String>> + Send>>> {
        let (body, checksum) = serialize_turn(question, model_id, session_id)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(CHECKSUM_HEADER, checksum)
            .body(body)
            .send()
            .await
            .context("Failed to reach chat endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("chat endpoint error ({}): {}", status, text));
        }

        Ok(decode_text_stream(response))
    }
}

/// Serialize the request body and compute its checksum over the exact bytes
/// that go on the wire.
fn serialize_turn(question: &str, model_id: &str, session_id: &str) -> Result<(String, String)> {
    let body = serde_json::to_string(&TurnBody {
        question,
        model: model_id,
        session_id,
    })?;

    let digest = Sha256::digest(body.as_bytes());
    let checksum = digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>();

    Ok((body, checksum))
}

/// Drain the response body chunk by chunk, yielding decoded text as soon as
/// it arrives.
fn decode_text_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<String>> + Send>> {
    decode_byte_chunks(
        response
            .bytes_stream()
            .map(|chunk| chunk.map_err(anyhow::Error::from)),
    )
}

/// Incremental UTF-8 decode over arbitrary chunk boundaries. A small carry
/// buffer holds bytes of a sequence split across chunks; nothing else is
/// buffered. A sequence still incomplete when the source ends is an error,
/// not a silent drop.
fn decode_byte_chunks<S, B>(chunks: S) -> Pin<Box<dyn Stream<Item = Result<String>> + Send>>
where
    S: Stream<Item = Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(chunks);
        let mut pending: Vec<u8> = Vec::new();

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    pending.extend_from_slice(bytes.as_ref());

                    match std::str::from_utf8(&pending) {
                        Ok(text) => {
                            if !text.is_empty() {
                                yield Ok(text.to_string());
                            }
                            pending.clear();
                        }
                        Err(e) => {
                            if e.error_len().is_some() {
                                yield Err(anyhow!("invalid UTF-8 in response stream"));
                                return;
                            }

                            let valid = e.valid_up_to();
                            if valid > 0 {
                                // from_utf8 already validated this prefix
                                let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
                                yield Ok(text);
                                pending.drain(..valid);
                            }
                        }
                    }
                }
                Err(e) => {
                    yield Err(anyhow!("Stream error: {}", e));
                    return;
                }
            }
        }

        if !pending.is_empty() {
            yield Err(anyhow!("response stream ended mid UTF-8 sequence"));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_uses_wire_field_names() {
        let (body, _) = serialize_turn("What?", "llama32-3b", "s-1").unwrap();
        assert!(body.contains("\"question\":\"What?\""));
        assert!(body.contains("\"model\":\"llama32-3b\""));
        assert!(body.contains("\"sessionId\":\"s-1\""));
    }

    #[test]
    fn checksum_is_hex_sha256_of_body() {
        let (body, checksum) = serialize_turn("q", "m", "s").unwrap();

        assert_eq!(checksum.len(), 64);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));

        let expected = Sha256::digest(body.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<String>();
        assert_eq!(checksum, expected);
    }

    #[test]
    fn checksum_changes_with_body() {
        let (_, a) = serialize_turn("q1", "m", "s").unwrap();
        let (_, b) = serialize_turn("q2", "m", "s").unwrap();
        assert_ne!(a, b);
    }

    fn chunk_stream(
        chunks: Vec<Result<Vec<u8>>>,
    ) -> impl Stream<Item = Result<Vec<u8>>> + Send + 'static {
        futures::stream::iter(chunks)
    }

    async fn collect(mut stream: Pin<Box<dyn Stream<Item = Result<String>> + Send>>) -> Vec<Result<String>> {
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn decode_carries_multibyte_char_across_chunk_boundary() {
        // "é" (0xC3 0xA9) split between chunks
        let stream = decode_byte_chunks(chunk_stream(vec![
            Ok(b"ab\xC3".to_vec()),
            Ok(b"\xA9c".to_vec()),
        ]));

        let items = collect(stream).await;
        let pieces: Vec<String> = items.into_iter().map(|i| i.unwrap()).collect();
        assert_eq!(pieces, vec!["ab".to_string(), "éc".to_string()]);
        assert_eq!(pieces.concat(), "abéc");
    }

    #[tokio::test]
    async fn decode_rejects_invalid_utf8() {
        let stream = decode_byte_chunks(chunk_stream(vec![Ok(b"ok".to_vec()), Ok(vec![0xFF])]));

        let items = collect(stream).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref().unwrap(), "ok");
        assert!(items[1]
            .as_ref()
            .unwrap_err()
            .to_string()
            .contains("invalid UTF-8"));
    }

    #[tokio::test]
    async fn decode_flags_truncated_trailing_sequence() {
        // Body cut off after the first byte of a two-byte character
        let stream = decode_byte_chunks(chunk_stream(vec![Ok(b"a\xC3".to_vec())]));

        let items = collect(stream).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref().unwrap(), "a");
        assert!(items[1]
            .as_ref()
            .unwrap_err()
            .to_string()
            .contains("ended mid UTF-8"));
    }
}
