use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::aggregator::{aggregate_stream, StreamOutcome, TextStream};
use super::config::LlmClientConfig;
use super::sse::{decode_chunk_stream, ChunkStream};
use super::types::{
    ChatCompletion, ChatCompletionRequest, ChatMessage, ToolCallMap, ToolChoice, ToolDefinition,
};
use crate::{FncallError, Result};

/// What a dispatched call produced; callers match on the variant
#[derive(Debug)]
pub enum CallOutcome {
    /// Streaming text answer, handed back unconsumed past the first content chunk
    Text(TextStream<ChunkStream>),
    /// Streaming tool calls, assembled by position index
    ToolCalls(ToolCallMap),
    /// Streaming response cut off before its finish signal
    Incomplete(ToolCallMap),
    /// Non-streaming response object
    Completion(ChatCompletion),
}

impl From<StreamOutcome<ChunkStream>> for CallOutcome {
    fn from(outcome: StreamOutcome<ChunkStream>) -> Self {
        match outcome {
            StreamOutcome::Text(stream) => CallOutcome::Text(stream),
            StreamOutcome::ToolCalls(map) => CallOutcome::ToolCalls(map),
            StreamOutcome::Incomplete(map) => CallOutcome::Incomplete(map),
        }
    }
}

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Clone)]
pub struct LlmClient {
    pub(crate) http: Client,
    pub(crate) cfg: LlmClientConfig,
}

impl LlmClient {
    pub fn new(cfg: LlmClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| FncallError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(LlmClientConfig::default())
    }

    pub fn config(&self) -> &LlmClientConfig {
        &self.cfg
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.cfg.base_url.trim_end_matches('/'))
    }

    /// Assemble a request body; tools and tool_choice are omitted without tools
    pub fn build_request(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
        tool_choice: ToolChoice,
        stream: bool,
    ) -> ChatCompletionRequest {
        let tools = tools.filter(|t| !t.is_empty()).map(<[ToolDefinition]>::to_vec);
        let tool_choice = tools.as_ref().map(|_| tool_choice);
        ChatCompletionRequest {
            model: self.cfg.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.cfg.max_tokens,
            temperature: self.cfg.temperature,
            stream,
            tools,
            tool_choice,
        }
    }

    async fn post(&self, req: &ChatCompletionRequest) -> Result<Response> {
        let url = self.chat_url();
        debug!(
            target = "llm_client",
            model = %req.model,
            stream = req.stream,
            tools = req.tools.as_ref().map_or(0, Vec::len),
            "POST {}", url
        );

        let mut builder = self
            .http
            .post(&url)
            .header("content-type", "application/json");
        if let Some(key) = &self.cfg.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.json(req).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            error!(target = "llm_client", %status, message = %message, "Chat Completions error");
            return Err(FncallError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }

    /// Blocking mode: one composed response object
    pub async fn create_chat_completion(
        &self,
        req: &ChatCompletionRequest,
    ) -> Result<ChatCompletion> {
        let resp = self.post(req).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            FncallError::Decode(format!("Failed to parse Chat Completions JSON: {e}"))
        })
    }

    /// Streaming mode: the decoded chunk sequence, not yet inspected
    pub async fn create_chat_completion_stream(
        &self,
        req: &ChatCompletionRequest,
    ) -> Result<ChunkStream> {
        let resp = self.post(req).await?;
        Ok(decode_chunk_stream(resp.bytes_stream()))
    }

    /// Dispatch one request and propagate every failure.
    ///
    /// Streaming responses go through the chunk aggregator; non-streaming ones are
    /// returned as `CallOutcome::Completion`.
    pub async fn try_call_with_function_call(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
        tool_choice: ToolChoice,
        stream: bool,
    ) -> Result<CallOutcome> {
        let req = self.build_request(messages, tools, tool_choice, stream);
        if stream {
            let chunks = self.create_chat_completion_stream(&req).await?;
            Ok(aggregate_stream(chunks).await?.into())
        } else {
            Ok(CallOutcome::Completion(self.create_chat_completion(&req).await?))
        }
    }

    /// Dispatch one request; failures are logged and surface as `None`.
    pub async fn call_with_function_call(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
        tool_choice: ToolChoice,
        stream: bool,
    ) -> Option<CallOutcome> {
        match self
            .try_call_with_function_call(messages, tools, tool_choice, stream)
            .await
        {
            Ok(CallOutcome::Incomplete(partial)) => {
                warn!(
                    target = "llm_client",
                    partial_tool_calls = partial.len(),
                    "stream ended before a finish signal"
                );
                Some(CallOutcome::Incomplete(partial))
            }
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(
                    target = "llm_client",
                    error = %e,
                    detail = ?e,
                    "chat completion call failed"
                );
                None
            }
        }
    }
}
