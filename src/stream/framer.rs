//! Line framing across chunk boundaries
//!
//! A chunk boundary may fall anywhere: inside a JSON payload, inside the
//! `[DONE]` terminator, even inside a multi-byte UTF-8 character. The framer
//! therefore buffers raw bytes and only decodes a line once its newline has
//! arrived.

use crate::error::{FramingError, TurnError};
use crate::llm::LlmError;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;

/// Upper bound for a single unterminated line
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Splits a byte stream into text lines
#[derive(Debug)]
pub struct LineFramer {
    /// Bytes after the last newline seen so far. Never contains `\n`.
    pending: Vec<u8>,
    max_line_bytes: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_limit(MAX_LINE_BYTES)
    }

    pub fn with_limit(max_line_bytes: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line_bytes,
        }
    }

    /// Feed one chunk and return every line it completed, in order.
    ///
    /// Lines are returned without their `\n` (or `\r\n`) terminator. On error
    /// the buffered fragment is dropped; the turn is over anyway.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, FramingError> {
        // `pending` holds no newline, so only the new bytes need scanning
        let mut search_from = self.pending.len();
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut line_start = 0;
        while let Some(offset) = self.pending[search_from..].iter().position(|&b| b == b'\n') {
            let line_end = search_from + offset;
            match decode_line(&self.pending[line_start..line_end]) {
                Ok(line) => lines.push(line),
                Err(e) => {
                    self.pending.clear();
                    return Err(e);
                }
            }
            line_start = line_end + 1;
            search_from = line_start;
        }
        self.pending.drain(..line_start);

        if self.pending.len() > self.max_line_bytes {
            self.pending.clear();
            return Err(FramingError::LineTooLong {
                limit: self.max_line_bytes,
            });
        }

        Ok(lines)
    }

    /// Flush the trailing unterminated fragment, if any, as a final line.
    pub fn finish(&mut self) -> Result<Option<String>, FramingError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest).map(Some)
    }

    /// Number of buffered bytes awaiting a newline
    #[allow(dead_code)] // API completeness
    pub fn buffered_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(bytes: &[u8]) -> Result<String, FramingError> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|e| FramingError::InvalidUtf8(e.to_string()))
}

struct FrameState<S> {
    source: S,
    framer: LineFramer,
    ready: VecDeque<String>,
    finished: bool,
}

/// Pull-based adapter: turns a chunk stream into a stream of complete lines.
///
/// Transport and framing errors are yielded once, after which the stream
/// ends. When the source ends cleanly the trailing fragment is flushed.
pub fn framed_lines<S, B>(source: S) -> impl Stream<Item = Result<String, TurnError>>
where
    S: Stream<Item = Result<B, LlmError>> + Unpin,
    B: AsRef<[u8]>,
{
    let state = FrameState {
        source,
        framer: LineFramer::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(line) = st.ready.pop_front() {
                return Some((Ok(line), st));
            }
            if st.finished {
                return None;
            }

            match st.source.next().await {
                Some(Ok(chunk)) => match st.framer.push(chunk.as_ref()) {
                    Ok(lines) => st.ready.extend(lines),
                    Err(e) => {
                        st.finished = true;
                        return Some((Err(e.into()), st));
                    }
                },
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e.into()), st));
                }
                None => {
                    st.finished = true;
                    match st.framer.finish() {
                        Ok(Some(line)) => st.ready.push_back(line),
                        Ok(None) => {}
                        Err(e) => return Some((Err(e.into()), st)),
                    }
                }
            }
        }
    })
}
