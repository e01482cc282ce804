//! Server-sent events decoding for streamed summaries
//!
//! The backend emits `data: {json}` lines and finishes with `data: [DONE]`.
//! Network chunks don't respect line boundaries, so bytes are buffered until
//! a full line is available.

use tracing::debug;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// A decoded SSE payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Summary text fragment
    Chunk(String),
    /// End-of-stream sentinel
    Done,
}

/// Incremental line-buffered decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every frame completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(frame) = decode_line(&line[..line.len() - 1]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush a trailing line that had no newline
    pub fn finish(&mut self) -> Option<SseFrame> {
        let line = std::mem::take(&mut self.buffer);
        decode_line(&line)
    }
}

fn decode_line(raw: &[u8]) -> Option<SseFrame> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches('\r');
    let data = line.strip_prefix(DATA_PREFIX)?;

    if data == DONE_SENTINEL {
        return Some(SseFrame::Done);
    }

    let value: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            debug!("Skipping invalid SSE payload: {e}");
            return None;
        }
    };

    let text = ["content", "chunk"]
        .iter()
        .filter_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .find(|s| !s.is_empty())?;

    Some(SseFrame::Chunk(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_content_and_chunk_keys() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(
            b"data: {\"content\":\"A truck \"}\n\ndata: {\"chunk\":\"enters.\"}\ndata: [DONE]\n",
        );
        assert_eq!(
            frames,
            vec![
                SseFrame::Chunk("A truck ".to_string()),
                SseFrame::Chunk("enters.".to_string()),
                SseFrame::Done,
            ]
        );
    }

    #[test]
    fn buffers_lines_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"cont").is_empty());
        assert!(decoder.push(b"ent\":\"caf\xc3").is_empty());
        let frames = decoder.push(b"\xa9\"}\r\n");
        assert_eq!(frames, vec![SseFrame::Chunk("café".to_string())]);
    }

    #[test]
    fn skips_invalid_json_comments_and_empty_text() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(
            b": keep-alive\nevent: update\ndata: not json\ndata: {\"content\":\"\"}\ndata: {\"other\":1}\n",
        );
        assert!(frames.is_empty());
    }

    #[test]
    fn finish_flushes_trailing_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"content\":\"tail\"}").is_empty());
        assert_eq!(decoder.finish(), Some(SseFrame::Chunk("tail".to_string())));
        assert_eq!(decoder.finish(), None);
    }
}
