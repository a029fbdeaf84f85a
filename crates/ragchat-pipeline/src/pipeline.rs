use crate::error::PipelineError;
use crate::events::TurnEvent;
use crate::prompts::{qa_messages, rephrase_messages};
use crate::thread::ThreadState;
use anyhow::Result;
use futures::StreamExt;
use ragchat_llm::{ChatClient, ChatOptions, ChatRequest, ModelDescriptor, StreamEvent};
use ragchat_retrieval::{stitch_context, Retriever};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Executes exactly one question→answer cycle and produces an incremental
/// token stream.
///
/// A pipeline is constructed per invocation with its collaborators injected;
/// there is no shared state between runs. The run walks a fixed sequence:
/// validate, rewrite the question against prior history, retrieve context,
/// generate with streaming, then record the finished turn on the thread.
/// Upstream failures never escape as `Err`: they become a terminal
/// [`TurnEvent::Error`] on the same channel, and the channel closes normally.
#[derive(Clone)]
pub struct ChatTurnPipeline {
    chat_client: Arc<dyn ChatClient>,
    retriever: Arc<dyn Retriever>,
    model: ModelDescriptor,
}

impl ChatTurnPipeline {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        retriever: Arc<dyn Retriever>,
        model: ModelDescriptor,
    ) -> Self {
        Self {
            chat_client,
            retriever,
            model,
        }
    }

    /// Validate, then run the turn in a background task, returning the event
    /// receiver. Only validation failures are returned as `Err` — they reject
    /// the turn before any stream is opened.
    pub fn spawn_run(
        &self,
        question: &str,
        mut thread: ThreadState,
    ) -> Result<mpsc::Receiver<TurnEvent>, PipelineError> {
        let question = Self::validate(question)?;
        let (tx, rx) = mpsc::channel(256);

        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.run_validated(question, &mut thread, tx).await;
        });

        Ok(rx)
    }

    /// Run the turn in place for callers that hold the thread across the run.
    /// This is the primitive [`spawn_run`](Self::spawn_run) dispatches to.
    pub async fn run(
        &self,
        question: &str,
        thread: &mut ThreadState,
        tx: mpsc::Sender<TurnEvent>,
    ) -> Result<(), PipelineError> {
        let question = Self::validate(question)?;
        self.run_validated(question, thread, tx).await;
        Ok(())
    }

    async fn run_validated(
        &self,
        question: String,
        thread: &mut ThreadState,
        tx: mpsc::Sender<TurnEvent>,
    ) {
        if let Err(e) = execute_turn(
            Arc::clone(&self.chat_client),
            Arc::clone(&self.retriever),
            self.model.clone(),
            question,
            thread,
            tx.clone(),
        )
        .await
        {
            tracing::error!(error = %e, "chat turn failed");
            let _ = tx
                .send(TurnEvent::Error {
                    message: e.to_string(),
                })
                .await;
        }
    }

    fn validate(question: &str) -> Result<String, PipelineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }
        Ok(question.to_string())
    }
}

async fn execute_turn(
    chat_client: Arc<dyn ChatClient>,
    retriever: Arc<dyn Retriever>,
    model: ModelDescriptor,
    question: String,
    thread: &mut ThreadState,
    tx: mpsc::Sender<TurnEvent>,
) -> Result<()> {
    let thread_id = thread.thread_id();
    tracing::debug!(%thread_id, model = %model.id, "turn start");

    // With no prior history there is nothing to disambiguate; the standalone
    // question is the original question verbatim.
    let standalone = if thread.history().is_empty() {
        question.clone()
    } else {
        rewrite_question(&chat_client, &model, thread.history(), &question).await?
    };

    let fragments = retriever.retrieve(&standalone).await?;
    let context = stitch_context(&fragments);
    tracing::debug!(%thread_id, fragments = fragments.len(), "context retrieved");

    let request = ChatRequest::new(
        &model.model_name,
        qa_messages(&context, thread.history(), &question),
    )
    .with_options(ChatOptions::new().temperature(0.0));

    let mut stream = chat_client.chat_stream(request).await?;
    let mut answer = String::new();

    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Message { content } => {
                answer.push_str(&content);
                if tx.send(TurnEvent::Token { content }).await.is_err() {
                    // Receiver gone: the caller dropped the connection.
                    // Abandon the rest of the generation instead of buffering
                    // output nobody will read.
                    tracing::debug!(%thread_id, "receiver dropped, abandoning turn");
                    return Ok(());
                }
            }
            StreamEvent::Done { .. } => break,
        }
    }

    // Both entries land together, after the stream ends; future rewriting
    // only ever sees the final text.
    thread.record_turn(question, answer.clone());

    tracing::debug!(%thread_id, answer_len = answer.len(), "turn done");
    let _ = tx.send(TurnEvent::Done { answer }).await;
    Ok(())
}

async fn rewrite_question(
    chat_client: &Arc<dyn ChatClient>,
    model: &ModelDescriptor,
    history: &[ragchat_llm::Message],
    question: &str,
) -> Result<String> {
    let request = ChatRequest::new(&model.model_name, rephrase_messages(history, question))
        .with_options(ChatOptions::new().temperature(0.0));

    let response = chat_client.chat(request).await?;
    let rewritten = response
        .content
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| question.to_string());

    tracing::debug!(original = %question, %rewritten, "question rewritten");
    Ok(rewritten)
}
