//! Reading `/api/generate` responses.
//!
//! A streaming body is newline-delimited JSON: every line carries a `response`
//! fragment and a `done` flag, and the line with `done: true` also carries the
//! timing and token counters. A buffered body is that final object on its own.

use crate::cancel::CancelFlag;
use crate::error::{ClientError, Result};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, LinesCodec};
use tracing::{debug, trace};

/// Completion metadata from the terminal record of a generation.
///
/// Durations are nanoseconds. Counters the server leaves out read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub total_duration: u64,

    #[serde(default)]
    pub load_duration: u64,

    #[serde(default)]
    pub prompt_eval_duration: u64,

    #[serde(default)]
    pub eval_duration: u64,

    #[serde(default)]
    pub prompt_eval_count: u64,

    #[serde(default)]
    pub eval_count: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,

    /// Token context the server hands back for follow-up prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
}

/// One line of a streaming body, or the whole buffered body.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,

    #[serde(default)]
    pub done: bool,

    #[serde(flatten)]
    pub result: GenerationResult,
}

/// How a streaming read ended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamOutcome {
    /// The terminal record, if a `done: true` line arrived.
    pub result: Option<GenerationResult>,
    /// True when the reader stopped because the cancel flag was set.
    pub cancelled: bool,
}

impl StreamOutcome {
    pub fn completed(result: GenerationResult) -> Self {
        Self {
            result: Some(result),
            cancelled: false,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            result: None,
            cancelled: true,
        }
    }
}

/// Splits arbitrary byte chunks into lines.
struct LineFramer {
    codec: LinesCodec,
    buffer: BytesMut,
}

impl LineFramer {
    fn new() -> Self {
        Self {
            codec: LinesCodec::new(),
            buffer: BytesMut::new(),
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.codec.decode(&mut self.buffer)?)
    }

    /// Returns whatever is left once the body has ended without a newline.
    fn finish(&mut self) -> Result<Option<String>> {
        Ok(self.codec.decode_eof(&mut self.buffer)?)
    }
}

/// Consumes a newline-delimited JSON body, passing each `response` fragment to
/// `on_chunk` in the order received.
///
/// Reading stops at the first `done: true` line, at end of body, or when
/// `cancel` is observed (checked once per line). A line that is not valid JSON
/// aborts the read with an error; fragments already passed on stay passed on.
pub async fn read_stream<S, E, F>(body: S, mut on_chunk: F, cancel: &CancelFlag) -> Result<StreamOutcome>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    ClientError: From<E>,
    F: FnMut(&str),
{
    futures::pin_mut!(body);
    let mut framer = LineFramer::new();
    let mut eof = false;

    loop {
        let line = if let Some(line) = framer.next_line()? {
            line
        } else if eof {
            break;
        } else {
            match body.next().await {
                Some(chunk) => {
                    framer.push(&chunk?);
                    continue;
                }
                None => {
                    eof = true;
                    match framer.finish()? {
                        Some(line) => line,
                        None => break,
                    }
                }
            }
        };

        if cancel.is_cancelled() {
            debug!("Stream read cancelled");
            return Ok(StreamOutcome::cancelled());
        }

        if line.trim().is_empty() {
            continue;
        }

        trace!(line = %line, "stream line");
        let parsed: GenerateResponse = serde_json::from_str(&line)?;
        on_chunk(&parsed.response);

        if parsed.done {
            debug!(done_reason = ?parsed.result.done_reason, "Terminal record received");
            return Ok(StreamOutcome::completed(parsed.result));
        }
    }

    debug!("Stream closed without a terminal record");
    Ok(StreamOutcome::default())
}

/// Parses a non-streaming body into its text and terminal record.
pub fn parse_buffered(body: &str) -> Result<(String, GenerationResult)> {
    let parsed: GenerateResponse = serde_json::from_str(body)?;
    Ok((parsed.response, parsed.result))
}
