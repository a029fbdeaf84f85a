use thiserror::Error;

/// Failures that reject a turn before any stream is opened.
///
/// Everything that goes wrong after validation (rewrite, retrieval,
/// generation) is caught inside the run and surfaced as a terminal
/// [`TurnEvent::Error`](crate::TurnEvent) instead of an `Err`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
