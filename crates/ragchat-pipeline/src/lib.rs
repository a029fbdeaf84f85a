mod error;
mod events;
mod pipeline;
mod prompts;
mod thread;

pub use error::PipelineError;
pub use events::TurnEvent;
pub use pipeline::ChatTurnPipeline;
pub use thread::ThreadState;
