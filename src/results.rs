//! Consumes the ordered output stream of a completed run.
//!
//! Thread messages come back from the runner oldest-first; that order decides
//! both the narration order and which explanatory text each chart belongs to,
//! so it is preserved end to end. Extraction is lazy: messages are converted
//! one at a time as the sequence is walked.

use crate::assistants::{MessageContent, ThreadMessage};

/// One unit of run output: optional text plus zero or more artifact
/// references, in the order they appeared within the message.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMessage {
    pub role: String,
    pub text: Option<String>,
    pub artifacts: Vec<String>,
}

/// Walks messages oldest-first, surfacing text verbatim and collecting
/// artifact references without fetching any bytes.
pub fn extract(messages: Vec<ThreadMessage>) -> impl Iterator<Item = ResultMessage> {
    messages.into_iter().map(|message| {
        let mut texts: Vec<String> = Vec::new();
        let mut artifacts: Vec<String> = Vec::new();

        for block in message.content {
            match block {
                MessageContent::Text { text } => texts.push(text.value),
                MessageContent::ImageFile { image_file } => artifacts.push(image_file.file_id),
                MessageContent::Other => {}
            }
        }

        ResultMessage {
            role: message.role,
            text: if texts.is_empty() {
                None
            } else {
                Some(texts.join("\n"))
            },
            artifacts,
        }
    })
}
