pub mod cache;
pub mod chat;
pub mod handler;

pub use cache::{AnswerCache, CacheGeneration};
pub use chat::{ChatMessage, ChatRole, NO_DOCUMENT_MESSAGE, chat_response};
pub use handler::{
    AnswerOrigin, CONTEXT_SEPARATOR, QueryAnswer, QueryHandler, RETRIEVAL_EMPTY_MESSAGE,
    RETRIEVAL_FAILED_MESSAGE,
};
