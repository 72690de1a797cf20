//! LLM module: chat-completion client, SSE decoding, and stream aggregation
//!
//! This module provides:
//! - `LlmClientConfig`, `LlmClient`, `CallOutcome` for talking to OpenAI-compatible backends
//! - `SseDecoder`, `decode_chunk_stream` for turning `stream: true` bodies into chunks
//! - `ToolCallAccumulator`, `aggregate_stream` for reassembling streamed tool calls
//! - request/response wire types (`ChatMessage`, `ToolDefinition`, `ToolChoice`, ...)

mod aggregator;
mod client;
mod config;
mod sse;
mod types;

pub use aggregator::{aggregate_stream, ChunkStep, StreamOutcome, TextStream, ToolCallAccumulator};
pub use client::{CallOutcome, LlmClient};
pub use config::{
    LlmClientConfig, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TEMPERATURE,
};
pub use sse::{decode_chunk_stream, ChunkStream, SseDecoder};
pub use types::{
    AssistantMessage, ChatCompletion, ChatCompletionChunk, ChatCompletionRequest, ChatMessage,
    ChunkChoice, ChunkDelta, CompletionChoice, FunctionCall, FunctionCallDelta,
    FunctionDefinition, ToolCallDelta, ToolCallMap, ToolCallRecord, ToolChoice, ToolDefinition,
};
