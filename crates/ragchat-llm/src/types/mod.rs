mod content;
mod message;

pub use content::{Content, ContentPart};
pub use message::Message;
