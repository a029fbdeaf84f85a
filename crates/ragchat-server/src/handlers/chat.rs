use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};
use ragchat_pipeline::{ChatTurnPipeline, ThreadState, TurnEvent};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    pub question: String,
    #[serde(default)]
    pub model: Option<String>,
    pub session_id: String,
}

/// Run one chat turn and stream the answer as a plain-text body.
///
/// The body is the raw concatenation of generated fragments in emission
/// order, closed with a single trailing newline on success. Upstream
/// failures mid-stream keep the already-emitted prefix and append a single
/// `Error: <message>` line; the stream still closes normally. Only input
/// validation fails the request before the stream opens.
pub async fn chat_turn_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatTurnRequest>,
) -> ApiResult<Response> {
    if req.session_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "sessionId must not be empty".to_string(),
        ));
    }
    if req.question.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "question must not be empty".to_string(),
        ));
    }

    // Unknown ids fall back to the default model rather than failing.
    let descriptor = state.registry.resolve(req.model.as_deref()).clone();
    let chat_client = state.client_for(descriptor.provider);

    // One pipeline and one thread per invocation; nothing survives the call.
    let thread = ThreadState::new();
    tracing::info!(
        session_id = %req.session_id,
        thread_id = %thread.thread_id(),
        model = %descriptor.id,
        "chat turn"
    );

    let pipeline = ChatTurnPipeline::new(chat_client, Arc::clone(&state.retriever), descriptor);
    let receiver = pipeline
        .spawn_run(&req.question, thread)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let body_stream = ReceiverStream::new(receiver).map(|event| {
        let chunk = match event {
            TurnEvent::Token { content } => content,
            TurnEvent::Done { .. } => "\n".to_string(),
            TurnEvent::Error { message } => format!("Error: {}\n", message),
        };
        Ok::<Bytes, Infallible>(Bytes::from(chunk))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(body_stream))
        .map_err(|_| ApiError::Internal)
}
