//! Chat transcript types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// One entry in the conversation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Assistant greeting that opens the transcript after a successful analysis
pub fn greeting(file_name: &str) -> String {
    format!(
        "Hello! I've analyzed your document, \"{}\". You can see a summary on the right. How can I help you understand it better?",
        file_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_serializes_lowercase() {
        let msg = ChatMessage::ai("hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["sender"], "ai");
        assert_eq!(value["text"], "hi");
    }

    #[test]
    fn greeting_names_the_file() {
        assert!(greeting("lease.pdf").contains("\"lease.pdf\""));
    }
}
