use std::collections::VecDeque;
use std::pin::Pin;

use futures::StreamExt as _;
use futures::stream;
use tracing::warn;

use crate::errors::RemoteError;
use crate::event::Event;

pub(crate) type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

/// Splits a streamQuery body into JSON payloads.
///
/// The runtime answers either with SSE (`data:` lines, blank-line separated)
/// or with newline-delimited JSON. Both are accepted on the same connection.
#[derive(Default)]
pub(crate) struct FrameDecoder {
    buf: Vec<u8>,
    data_lines: Vec<String>,
}

impl FrameDecoder {
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(idx) = self.buf.iter().position(|b| *b == b'\n') {
            let line_bytes: Vec<u8> = self.buf.drain(..=idx).collect();
            let line = String::from_utf8_lossy(&line_bytes[..idx]);
            self.push_line(line.trim_end_matches('\r'), &mut payloads);
        }
        payloads
    }

    /// Flushes whatever is left once the body ends without a trailing newline.
    pub fn finish(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        if !self.buf.is_empty() {
            let rest = std::mem::take(&mut self.buf);
            let line = String::from_utf8_lossy(&rest);
            self.push_line(line.trim_end_matches('\r'), &mut payloads);
        }
        self.flush_data(&mut payloads);
        payloads
    }

    fn push_line(&mut self, line: &str, out: &mut Vec<String>) {
        if line.trim().is_empty() {
            self.flush_data(out);
            return;
        }
        if line.starts_with(':') || line.starts_with("event:") || line.starts_with("id:") {
            return;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            self.data_lines.push(rest.trim_start().to_string());
            return;
        }
        self.flush_data(out);
        out.push(line.to_string());
    }

    fn flush_data(&mut self, out: &mut Vec<String>) {
        if self.data_lines.is_empty() {
            return;
        }
        let data = self.data_lines.join("\n");
        self.data_lines.clear();
        out.push(data);
    }
}

/// Decodes one frame. Frames that are not JSON are logged and skipped; only
/// an in-band `error` object fails the stream.
pub(crate) fn decode_payload(payload: &str) -> Result<Option<Event>, RemoteError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() || trimmed == "[DONE]" {
        return Ok(None);
    }
    let value: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, frame = trimmed, "skipping undecodable stream frame");
            return Ok(None);
        }
    };
    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("remote stream reported an error");
        let status_code = error
            .get("code")
            .and_then(|v| v.as_u64())
            .and_then(|code| u16::try_from(code).ok());
        return Err(RemoteError::service(message, status_code));
    }
    Ok(Some(Event::from_value(value)))
}

pub(crate) fn event_stream(
    bytes_stream: ByteStream,
) -> impl futures::Stream<Item = Result<Event, RemoteError>> + Send {
    struct State {
        bytes_stream: ByteStream,
        decoder: FrameDecoder,
        pending: VecDeque<Event>,
        done: bool,
    }

    fn enqueue(state: &mut State, payloads: Vec<String>) -> Result<(), RemoteError> {
        for payload in payloads {
            if let Some(event) = decode_payload(&payload)? {
                state.pending.push_back(event);
            }
        }
        Ok(())
    }

    stream::try_unfold(
        State {
            bytes_stream,
            decoder: FrameDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Ok(Some((event, state)));
                }
                if state.done {
                    return Ok(None);
                }

                match state.bytes_stream.next().await {
                    Some(Ok(chunk)) => {
                        let payloads = state.decoder.push_chunk(&chunk);
                        enqueue(&mut state, payloads)?;
                    }
                    Some(Err(e)) => {
                        return Err(RemoteError::transport(format!(
                            "event stream read failed: {e}"
                        )));
                    }
                    None => {
                        let payloads = state.decoder.finish();
                        enqueue(&mut state, payloads)?;
                        state.done = true;
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt as _;

    #[test]
    fn sse_frames_survive_partial_chunk_boundaries() {
        let mut decoder = FrameDecoder::default();
        assert!(decoder.push_chunk(b"data: {\"author\":\"sco").is_empty());
        assert!(decoder.push_chunk(b"ring_agent\"}\n").is_empty());
        let payloads = decoder.push_chunk(b"\n");
        assert_eq!(payloads, vec!["{\"author\":\"scoring_agent\"}".to_string()]);
    }

    #[test]
    fn ndjson_lines_are_emitted_per_line() {
        let mut decoder = FrameDecoder::default();
        let payloads = decoder.push_chunk(b"{\"a\":1}\r\n{\"b\":2}\n{\"c\":");
        assert_eq!(payloads, vec!["{\"a\":1}", "{\"b\":2}"]);
        assert_eq!(decoder.push_chunk(b"3}"), Vec::<String>::new());
        assert_eq!(decoder.finish(), vec!["{\"c\":3}"]);
    }

    #[test]
    fn comments_and_event_names_are_skipped() {
        let mut decoder = FrameDecoder::default();
        let payloads = decoder.push_chunk(b": keepalive\nevent: message\ndata: {}\n\n");
        assert_eq!(payloads, vec!["{}"]);
    }

    #[test]
    fn done_marker_and_blank_payloads_decode_to_nothing() {
        assert_eq!(decode_payload("[DONE]").expect("done"), None);
        assert_eq!(decode_payload("   ").expect("blank"), None);
    }

    #[test]
    fn error_payload_becomes_service_error() {
        let err = decode_payload(r#"{"error":{"code":429,"message":"quota exceeded"}}"#)
            .expect_err("should fail");
        assert_eq!(err, RemoteError::service("quota exceeded", Some(429)));
    }

    #[test]
    fn malformed_json_frame_is_skipped() {
        assert_eq!(decode_payload("{not json").expect("skipped"), None);
    }

    #[tokio::test]
    async fn event_stream_yields_events_in_order_and_flushes_tail() {
        let chunks: Vec<Result<bytes::Bytes, reqwest::Error>> = vec![
            Ok(bytes::Bytes::from_static(b"{\"id\":\"e1\"}\n{\"id\":")),
            Ok(bytes::Bytes::from_static(b"\"e2\"}")),
        ];
        let events: Vec<_> = event_stream(Box::pin(stream::iter(chunks))).collect().await;
        let ids: Vec<_> = events
            .into_iter()
            .map(|e| e.expect("event").str_at("id").map(str::to_owned))
            .collect();
        assert_eq!(ids, vec![Some("e1".into()), Some("e2".into())]);
    }

    #[tokio::test]
    async fn bad_line_between_events_does_not_end_the_stream() {
        let chunks: Vec<Result<bytes::Bytes, reqwest::Error>> = vec![Ok(
            bytes::Bytes::from_static(b"{\"id\":\"e1\"}\n{bad\n{\"id\":\"e2\"}\n"),
        )];
        let events: Vec<_> = event_stream(Box::pin(stream::iter(chunks))).collect().await;
        let ids: Vec<_> = events
            .into_iter()
            .map(|e| e.expect("event").str_at("id").map(str::to_owned))
            .collect();
        assert_eq!(ids, vec![Some("e1".into()), Some("e2".into())]);
    }
}
