use super::handler::QueryHandler;
use crate::retrieval::DocumentId;
use serde::{Deserialize, Serialize};

pub const NO_DOCUMENT_MESSAGE: &str =
    "No document is loaded yet. Ingest a document first, then ask your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// One chat turn. Returns the cleared input box value and the history with
/// the user message and assistant reply appended. A blank message leaves the
/// history untouched.
pub async fn chat_response(
    handler: &QueryHandler,
    message: &str,
    mut history: Vec<ChatMessage>,
    active_document: Option<&DocumentId>,
) -> (String, Vec<ChatMessage>) {
    let question = message.trim();
    if question.is_empty() {
        return (String::new(), history);
    }

    let reply = match active_document {
        Some(document) => handler.ask(document, question).await.text,
        None => NO_DOCUMENT_MESSAGE.to_string(),
    };

    history.push(ChatMessage::user(question));
    history.push(ChatMessage::assistant(reply));
    (String::new(), history)
}
