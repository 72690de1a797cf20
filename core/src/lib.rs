// Fncall Core Library
// Chat-completion call site with streamed tool-call aggregation

pub mod llm;

// Export core types
pub use llm::{
    aggregate_stream, CallOutcome, ChatCompletionChunk, ChatMessage, LlmClient, LlmClientConfig,
    StreamOutcome, ToolCallMap, ToolCallRecord, ToolChoice, ToolDefinition,
};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FncallError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, FncallError>;
