//! Chunk aggregation for streamed chat completions
//!
//! Decides, chunk by chunk, whether the provider is answering in text (hand the
//! stream back untouched) or emitting tool-call fragments (merge them by index).

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use tracing::{debug, trace};

use super::types::{ChatCompletionChunk, ToolCallMap};
use crate::Result;

/// What a single chunk did to the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStep {
    /// No decision yet; keep reading
    Continue,
    /// The chunk carries non-empty text content
    Content,
    /// The chunk carries a finish signal
    Finished,
}

/// Index-keyed merge state for tool-call fragments
#[derive(Debug, Default, Clone)]
pub struct ToolCallAccumulator {
    records: ToolCallMap,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one chunk.
    ///
    /// Only the first choice is inspected. Content wins over everything else in
    /// the same chunk and leaves the state untouched. A non-empty id replaces the
    /// stored one; argument fragments are appended in arrival order and names are
    /// merged by `merge_name`.
    /// Fragments are merged before a finish signal on the same chunk is honoured.
    pub fn apply(&mut self, chunk: &ChatCompletionChunk) -> ChunkStep {
        let Some(choice) = chunk.choices.first() else {
            return ChunkStep::Continue;
        };
        let delta = &choice.delta;

        if delta.content.as_deref().is_some_and(|c| !c.is_empty()) {
            return ChunkStep::Content;
        }

        if let Some(fragments) = &delta.tool_calls {
            for fragment in fragments {
                let record = self.records.entry(fragment.index).or_default();
                if let Some(id) = fragment.id.as_deref().filter(|s| !s.is_empty()) {
                    record.id = id.to_string();
                }
                if let Some(function) = &fragment.function {
                    if let Some(name) = function.name.as_deref() {
                        merge_name(&mut record.function.name, name);
                    }
                    if let Some(args) = function.arguments.as_deref() {
                        record.function.arguments.push_str(args);
                    }
                }
                trace!(
                    target = "aggregator",
                    index = fragment.index,
                    "merged tool-call fragment"
                );
            }
        }

        if choice.finish_reason.is_some() {
            ChunkStep::Finished
        } else {
            ChunkStep::Continue
        }
    }

    pub fn records(&self) -> &ToolCallMap {
        &self.records
    }

    pub fn into_records(self) -> ToolCallMap {
        self.records
    }
}

/// A name that extends what is stored (including a repeat of the full name)
/// replaces it; any other non-empty fragment is appended.
fn merge_name(stored: &mut String, incoming: &str) {
    if incoming.is_empty() {
        return;
    }
    if incoming.starts_with(stored.as_str()) {
        stored.clear();
    }
    stored.push_str(incoming);
}

/// Result of aggregating a chunk stream
pub enum StreamOutcome<S> {
    /// The model answered in text; the stream is handed back
    Text(TextStream<S>),
    /// Finish signal seen before any content
    ToolCalls(ToolCallMap),
    /// The stream ended without a finish signal; partial records attached
    Incomplete(ToolCallMap),
}

impl<S> StreamOutcome<S> {
    pub fn is_text(&self) -> bool {
        matches!(self, StreamOutcome::Text(_))
    }

    /// Completed tool calls, `None` for text or incomplete streams
    pub fn tool_calls(&self) -> Option<&ToolCallMap> {
        match self {
            StreamOutcome::ToolCalls(map) => Some(map),
            _ => None,
        }
    }
}

impl<S> fmt::Debug for StreamOutcome<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamOutcome::Text(stream) => f.debug_tuple("Text").field(stream).finish(),
            StreamOutcome::ToolCalls(map) => f.debug_tuple("ToolCalls").field(map).finish(),
            StreamOutcome::Incomplete(map) => f.debug_tuple("Incomplete").field(map).finish(),
        }
    }
}

/// Text response stream: the chunk that revealed content, then the rest of upstream
pub struct TextStream<S> {
    head: Option<ChatCompletionChunk>,
    rest: S,
}

impl<S> TextStream<S> {
    pub fn new(head: ChatCompletionChunk, rest: S) -> Self {
        Self {
            head: Some(head),
            rest,
        }
    }

    /// The chunk that revealed content, until it has been yielded
    pub fn first_chunk(&self) -> Option<&ChatCompletionChunk> {
        self.head.as_ref()
    }

    pub fn into_parts(self) -> (Option<ChatCompletionChunk>, S) {
        (self.head, self.rest)
    }
}

impl<S> fmt::Debug for TextStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStream")
            .field("head", &self.head)
            .finish_non_exhaustive()
    }
}

impl<S> TextStream<S>
where
    S: Stream<Item = Result<ChatCompletionChunk>> + Unpin,
{
    /// Drain the stream and concatenate its text content
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(chunk) = self.next().await {
            if let Some(content) = chunk?.content() {
                text.push_str(content);
            }
        }
        Ok(text)
    }
}

impl<S> Stream for TextStream<S>
where
    S: Stream<Item = Result<ChatCompletionChunk>> + Unpin,
{
    type Item = Result<ChatCompletionChunk>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(head) = this.head.take() {
            return Poll::Ready(Some(Ok(head)));
        }
        Pin::new(&mut this.rest).poll_next(cx)
    }
}

/// Drive a chunk stream until it reveals text, finishes, or runs dry.
///
/// Errors read from the stream are propagated; nothing after the deciding chunk
/// is consumed.
pub async fn aggregate_stream<S>(mut stream: S) -> Result<StreamOutcome<S>>
where
    S: Stream<Item = Result<ChatCompletionChunk>> + Unpin,
{
    let mut acc = ToolCallAccumulator::new();

    while let Some(item) = stream.next().await {
        let chunk = item?;
        match acc.apply(&chunk) {
            ChunkStep::Continue => {}
            ChunkStep::Content => {
                debug!(target = "aggregator", "content detected; handing stream back");
                return Ok(StreamOutcome::Text(TextStream::new(chunk, stream)));
            }
            ChunkStep::Finished => {
                let records = acc.into_records();
                debug!(target = "aggregator", tool_calls = records.len(), "stream finished");
                return Ok(StreamOutcome::ToolCalls(records));
            }
        }
    }

    let records = acc.into_records();
    debug!(
        target = "aggregator",
        partial = records.len(),
        "stream ended without finish signal"
    );
    Ok(StreamOutcome::Incomplete(records))
}
