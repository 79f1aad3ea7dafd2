//! Server-Sent Events (SSE) parser for OpenAI-compatible streaming responses.
//!
//! This module turns a raw response body into a stream of classified lines.
//! Deciding what to do with each line (relay, stop, skip) is left to the
//! caller so it can check for cancellation between lines.

use bytes::Bytes;
use futures_util::Stream;
use serde::Deserialize;

/// Response structure for streaming chat completions.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// One line of an SSE body, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// `choices[0].delta.content` of a data event, non-empty.
    Content(String),
    /// The `data: [DONE]` sentinel.
    Done,
    /// A data event whose payload is not a chat-completion chunk.
    Malformed(String),
    /// Blank lines, comments, other fields, and events without content.
    Ignored,
}

/// Classifies a single SSE line.
///
/// # Example
///
/// ```
/// use tlstream::translation::{SseLine, parse_sse_line};
///
/// let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
/// assert_eq!(parse_sse_line(line), SseLine::Content("Hello".to_string()));
/// ```
pub fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return SseLine::Ignored;
    }

    let Some(payload) = line.strip_prefix("data: ") else {
        return SseLine::Ignored;
    };
    let payload = payload.trim();

    if payload == "[DONE]" {
        return SseLine::Done;
    }

    let Ok(response) = serde_json::from_str::<StreamResponse>(payload) else {
        return SseLine::Malformed(payload.to_string());
    };

    match response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
    {
        Some(content) if !content.is_empty() => SseLine::Content(content),
        _ => SseLine::Ignored,
    }
}

/// Converts a raw SSE byte stream into a stream of text lines.
///
/// Handles buffering across network chunks. Bytes are decoded only once a
/// full line is available, so multi-byte characters split across chunks
/// survive intact. A trailing line without a newline is flushed at the end.
pub fn sse_lines<S>(byte_stream: S) -> impl Stream<Item = reqwest::Result<String>> + Send
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    async_stream::stream! {
        use futures_util::StreamExt;

        let mut byte_stream = std::pin::pin!(byte_stream);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            buffer.extend_from_slice(&chunk);

            while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=line_end).collect();
                yield Ok(String::from_utf8_lossy(&line).into_owned());
            }
        }

        if !buffer.is_empty() {
            yield Ok(String::from_utf8_lossy(&buffer).into_owned());
        }
    }
}
