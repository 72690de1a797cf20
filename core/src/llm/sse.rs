//! Server-sent event decoding for `stream: true` chat completions

use std::pin::Pin;

use futures_util::{stream, Stream, StreamExt};
use tracing::{debug, trace};

use super::types::ChatCompletionChunk;
use crate::{FncallError, Result};

/// Boxed stream of decoded chunks, as returned by the streaming dispatcher
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

const DONE_MARKER: &str = "[DONE]";

/// Incremental line decoder for `data: {...}` events.
///
/// Bytes are buffered until a newline arrives, so JSON payloads and multi-byte
/// UTF-8 sequences split across network reads decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `data: [DONE]` has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed raw bytes; returns every chunk completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<ChatCompletionChunk>> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(item) = self.decode_line(&line) {
                out.push(item);
            }
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        out
    }

    /// Flush a trailing line that was not newline-terminated.
    ///
    /// A line that does not decode is a cut-off event and is dropped, so the
    /// stream simply ends.
    pub fn finish(&mut self) -> Option<Result<ChatCompletionChunk>> {
        if self.done || self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        match self.decode_line(&line) {
            Some(Err(e)) => {
                debug!(target = "llm_client", error = %e, "dropping truncated trailing event");
                None
            }
            other => other,
        }
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<Result<ChatCompletionChunk>> {
        let line = match std::str::from_utf8(raw) {
            Ok(s) => s.trim_end_matches(['\r', '\n']),
            Err(e) => {
                let msg = format!("stream line is not UTF-8: {e}");
                return Some(Err(FncallError::Decode(msg)));
            }
        };

        // blank lines separate events; ':' lines are comments (keep-alive)
        if line.is_empty() || line.starts_with(':') {
            return None;
        }
        let data = line.strip_prefix("data:")?.trim_start();
        if data == DONE_MARKER {
            trace!(target = "llm_client", "stream done marker");
            self.done = true;
            return None;
        }

        Some(serde_json::from_str::<ChatCompletionChunk>(data).map_err(|e| {
            FncallError::Decode(format!("malformed stream chunk: {e}; data={data}"))
        }))
    }
}

/// Turn a response byte stream into a stream of chunks
pub fn decode_chunk_stream<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<FncallError> + Send + 'static,
{
    let decoded = bytes
        .map(Some)
        .chain(stream::once(async { None }))
        .scan(SseDecoder::new(), |decoder, item| {
            let results = match item {
                Some(Ok(buf)) => decoder.push(buf.as_ref()),
                Some(Err(e)) => vec![Err(e.into())],
                None => decoder.finish().into_iter().collect(),
            };
            futures_util::future::ready(Some(results))
        })
        .flat_map(stream::iter);
    Box::pin(decoded)
}
