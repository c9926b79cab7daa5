//! Server-Sent Events framing for streamed `tools/call` responses.
//!
//! Only lines starting with `data:` carry payload. Each payload is tried as
//! a JSON-RPC message and the last one holding a `result` or `error` wins;
//! earlier progress frames and unparseable lines are dropped.

use crate::protocol::JsonRpcResponse;
use bytes::BytesMut;

/// Whether a `Content-Type` header announces an event stream.
pub fn is_event_stream(content_type: &str) -> bool {
    content_type
        .to_ascii_lowercase()
        .contains("text/event-stream")
}

/// Payload of a `data:` line, without the single optional space after the colon.
pub fn data_payload(line: &str) -> Option<&str> {
    let payload = line.strip_prefix("data:")?;
    Some(payload.strip_prefix(' ').unwrap_or(payload))
}

/// Lazily yield the `data:` payloads of a complete event-stream body.
pub fn data_payloads(body: &str) -> impl Iterator<Item = &str> {
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter_map(data_payload)
}

/// Adopt the last payload that decodes to a final JSON-RPC response.
pub fn last_response<'a>(payloads: impl IntoIterator<Item = &'a str>) -> Option<JsonRpcResponse> {
    payloads.into_iter().filter_map(decode_final).last()
}

fn decode_final(payload: &str) -> Option<JsonRpcResponse> {
    serde_json::from_str::<JsonRpcResponse>(payload)
        .ok()
        .filter(JsonRpcResponse::is_final)
}

/// Splits a chunked byte stream into complete lines.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: BytesMut,
}

impl SseLineBuffer {
    /// Append a chunk and return every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(pos + 1);
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = self.buffer.split();
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Incremental reader applying the last-final-response rule chunk by chunk.
#[derive(Debug, Default)]
pub struct SseResponseReader {
    lines: SseLineBuffer,
    adopted: Option<JsonRpcResponse>,
}

impl SseResponseReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        for line in self.lines.push(chunk) {
            self.consider(&line);
        }
    }

    /// The adopted response, if any frame qualified.
    pub fn finish(mut self) -> Option<JsonRpcResponse> {
        if let Some(line) = self.lines.finish() {
            self.consider(&line);
        }
        self.adopted
    }

    fn consider(&mut self, line: &str) {
        if let Some(response) = data_payload(line).and_then(decode_final) {
            self.adopted = Some(response);
        }
    }
}
