//! Server-sent-event framing shared by the streaming providers.
//!
//! Both Gemini (`alt=sse`) and OpenAI-compatible APIs stream `data: <json>`
//! lines. Network chunks can split a line anywhere, so bytes are buffered
//! until a newline arrives.

use crate::error::ProviderError;
use futures_util::StreamExt;

/// Incremental splitter from raw bytes to SSE `data` payloads.
#[derive(Debug, Default)]
pub(crate) struct SseBuffer {
    buffer: Vec<u8>,
}

impl SseBuffer {
    /// Append bytes and return every complete `data` payload now available.
    ///
    /// Only `data:` fields are payloads; comments (`:`), other fields
    /// (`event:`, `id:`, `retry:`), blank lines and `[DONE]` are dropped.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = parse_line(&line_bytes) {
                payloads.push(data);
            }
        }

        payloads
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(line_bytes: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line_bytes);
    let data = line.trim().strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    Some(data.to_string())
}

/// Drain a streaming response, handing each `data` payload to `on_payload`.
///
/// `on_payload` returns the text fragment carried by the payload (if any);
/// fragments are concatenated in arrival order.
pub(crate) async fn collect_stream<F>(
    provider: &str,
    response: reqwest::Response,
    mut on_payload: F,
) -> Result<String, ProviderError>
where
    F: FnMut(&str) -> Result<Option<String>, ProviderError>,
{
    let mut stream = response.bytes_stream();
    let mut sse = SseBuffer::default();
    let mut text = String::new();
    let mut fragments = 0usize;

    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| ProviderError::Api {
            provider: provider.to_string(),
            message: format!("stream read error: {e}"),
            status_code: None,
        })?;
        for payload in sse.push(&bytes) {
            if let Some(fragment) = on_payload(&payload)? {
                fragments += 1;
                text.push_str(&fragment);
            }
        }
    }
    if let Some(payload) = sse.finish() {
        if let Some(fragment) = on_payload(&payload)? {
            fragments += 1;
            text.push_str(&fragment);
        }
    }

    tracing::trace!(provider, fragments, "stream finished");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_splits_complete_lines() {
        let mut sse = SseBuffer::default();
        let payloads = sse.push(b"data: {\"a\":1}\n\ndata: {\"a\":2}\n");
        assert_eq!(payloads, vec!["{\"a\":1}", "{\"a\":2}"]);
    }

    #[test]
    fn test_sse_buffers_partial_lines() {
        let mut sse = SseBuffer::default();
        assert!(sse.push(b"data: {\"te").is_empty());
        let payloads = sse.push(b"xt\":\"hi\"}\n");
        assert_eq!(payloads, vec!["{\"text\":\"hi\"}"]);
    }

    #[test]
    fn test_sse_skips_done_and_comments() {
        let mut sse = SseBuffer::default();
        let payloads = sse.push(b": keep-alive\ndata: [DONE]\n\n");
        assert!(payloads.is_empty());
    }

    #[test]
    fn test_sse_ignores_non_data_fields() {
        let mut sse = SseBuffer::default();
        let payloads = sse.push(
            b"event: message_start\nid: 7\nretry: 3000\ndata: {\"z\":1}\n\nevent: ping\n",
        );
        assert_eq!(payloads, vec!["{\"z\":1}"]);
        assert!(sse.finish().is_none());
    }

    #[test]
    fn test_sse_finish_flushes_unterminated_line() {
        let mut sse = SseBuffer::default();
        assert!(sse.push(b"data: {\"x\":true}").is_empty());
        assert_eq!(sse.finish().as_deref(), Some("{\"x\":true}"));
        assert!(sse.finish().is_none());
    }

    #[test]
    fn test_sse_handles_crlf() {
        let mut sse = SseBuffer::default();
        let payloads = sse.push(b"data: {\"y\":0}\r\n\r\n");
        assert_eq!(payloads, vec!["{\"y\":0}"]);
    }
}
