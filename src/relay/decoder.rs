//! Text-event-stream frame decoding.

/// Incremental decoder turning a raw byte stream into discrete event
/// payloads.
///
/// A frame ends at a blank line (two consecutive line terminators, LF or
/// CRLF). Frames beginning with the `data:` marker yield their payload with
/// surrounding whitespace trimmed; any other frame is ignored. Bytes are
/// buffered across chunk boundaries, so a frame split over several chunks
/// (even mid-character) decodes identically to one delivered whole.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw chunk and drain every frame it completes, in arrival
    /// order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some((frame_end, boundary_len)) = find_frame_boundary(&self.buf) {
            let frame: Vec<u8> = self.buf.drain(..frame_end + boundary_len).collect();
            if let Some(payload) = decode_frame(&frame[..frame_end]) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Number of buffered bytes still waiting for a frame boundary.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

/// Locate the first blank line. Returns the frame's end offset and the
/// boundary's byte length.
fn find_frame_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i < buf.len() {
        if buf[i] != b'\n' {
            i += 1;
            continue;
        }
        // line terminator at i; a blank line follows iff the next line is empty
        match buf.get(i + 1) {
            Some(b'\n') => return Some((i + 1, 1)),
            Some(b'\r') if buf.get(i + 2) == Some(&b'\n') => return Some((i + 1, 2)),
            _ => i += 1,
        }
    }
    None
}

/// Extract the payload from one complete frame, or `None` when the frame
/// does not carry the `data:` marker.
fn decode_frame(frame: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(frame);
    let payload = text.trim_start().strip_prefix("data:")?;
    Some(payload.trim().to_string())
}
