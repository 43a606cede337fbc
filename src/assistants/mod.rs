pub mod client;
pub mod error;
pub mod types;

pub use client::AssistantsClient;
pub use error::AssistantsError;
pub use types::{MessageContent, RunStatus, ThreadMessage};
