//! UTF-8 safe decoding of byte chunks.
//!
//! Transports split the body wherever they like, including inside a
//! multi-byte character. The decoder keeps an incomplete trailing sequence
//! until the bytes that finish it arrive.

/// Replacement for a byte sequence that can never become valid UTF-8.
const REPLACEMENT: char = '\u{FFFD}';

#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `bytes` (plus any held-back prefix) as is complete.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        if self.pending.is_empty() {
            // Fast path: whole chunk is valid
            if let Ok(text) = std::str::from_utf8(bytes) {
                return text.to_string();
            }
        }
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    out.push_str(text);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid = start + e.valid_up_to();
                    // valid_up_to guarantees this range is UTF-8
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid]));
                    match e.error_len() {
                        Some(len) => {
                            tracing::debug!(
                                target: "uistream::decoder",
                                bytes = len,
                                "replacing invalid UTF-8 sequence"
                            );
                            out.push(REPLACEMENT);
                            start = valid + len;
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more bytes
                            start = valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
        out
    }

    /// Flush whatever is still held back. An incomplete sequence at end of
    /// stream can never be completed and becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let bytes = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Bytes waiting for the rest of their character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
