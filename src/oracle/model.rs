//! Chat backends.

use serde::{Deserialize, Serialize};

use super::error::OracleResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A language model answering a conversation with one message.
///
/// Implementations block until the reply is available and must be usable
/// from several worker threads at once.
pub trait ChatModel: Send + Sync {
    /// Backend identifier, e.g. `openai:gpt-4o`.
    fn name(&self) -> String;

    fn complete(&self, messages: &[ChatMessage]) -> OracleResult<String>;
}
