use crate::{error::StratumError, request::Request, response::Response};

use bytes::{Buf, BufMut, BytesMut};
use std::collections::VecDeque;
use tokio_util::codec::{Decoder, Encoder};

/// Maximum size of a single stratum request line, in bytes.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Newline-delimited JSON-RPC codec for the miner-facing stratum port.
///
/// Decoding a line normally yields one [`Request`]. As a fallback for older clients
/// that write two JSON objects back to back on one line, a line that doesn't parse
/// as a single object is rescanned for balanced `{...}` spans and each one that
/// parses on its own is queued and returned on subsequent calls.
#[derive(Default)]
pub struct StratumCodec {
    pending: VecDeque<Request>,
}

impl Decoder for StratumCodec {
    type Item = Request;
    type Error = StratumError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if let Some(request) = self.pending.pop_front() {
                return Ok(Some(request));
            }

            let Some(newline_at) = src.iter().position(|&b| b == b'\n') else {
                if src.len() > MAX_LINE_LENGTH {
                    return Err(StratumError::Flood);
                }
                return Ok(None);
            };

            if newline_at > MAX_LINE_LENGTH {
                src.advance(newline_at + 1);
                return Err(StratumError::Flood);
            }

            let line = src.split_to(newline_at + 1);
            // Drop the trailing '\n' (and a possible preceding '\r').
            let line = &line[..line.len() - 1];
            let line = if line.last() == Some(&b'\r') { &line[..line.len() - 1] } else { line };

            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }

            match serde_json::from_slice::<Request>(line) {
                Ok(request) => {
                    self.pending.push_back(request);
                }
                Err(single_error) => {
                    let text = String::from_utf8_lossy(line);
                    let spans = extract_balanced_braces(&text);
                    if spans.is_empty() {
                        return Err(StratumError::Malformed(single_error));
                    }
                    let mut recovered_any = false;
                    for span in spans {
                        if let Ok(request) = serde_json::from_str::<Request>(span) {
                            self.pending.push_back(request);
                            recovered_any = true;
                        }
                    }
                    if !recovered_any {
                        return Err(StratumError::Malformed(single_error));
                    }
                }
            }
        }
    }
}

impl Encoder<Response> for StratumCodec {
    type Error = StratumError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = serde_json::to_vec(&item)?;
        dst.reserve(bytes.len() + 1);
        dst.put_slice(&bytes);
        dst.put_u8(b'\n');
        Ok(())
    }
}

/// Scans `text` for top-level balanced `{...}` spans, ignoring braces that occur
/// inside string literals.
fn extract_balanced_braces(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        spans.push(&text[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_one_request_per_line() {
        let mut codec = StratumCodec::default();
        let mut buf = BytesMut::from("{\"id\":1,\"jsonrpc\":\"2.0\",\"method\":\"eth_getWork\",\"params\":[]}\n");
        let request = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(request.method, "eth_getWork");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn recovers_two_concatenated_objects() {
        let mut codec = StratumCodec::default();
        let mut buf = BytesMut::from(
            "{\"id\":1,\"jsonrpc\":\"2.0\",\"method\":\"eth_getWork\",\"params\":[]}{\"id\":2,\"jsonrpc\":\"2.0\",\"method\":\"eth_submitHashrate\",\"params\":[]}\n",
        );
        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.method, "eth_getWork");
        assert_eq!(second.method, "eth_submitHashrate");
    }

    #[test]
    fn flood_detection_closes_on_oversized_line() {
        let mut codec = StratumCodec::default();
        let mut buf = BytesMut::from(format!("{}\n", "x".repeat(MAX_LINE_LENGTH + 1)).as_bytes());
        assert!(matches!(codec.decode(&mut buf), Err(StratumError::Flood)));
    }
}
