//! Test fixtures utilities: load UI stream fixtures and decode them under
//! different chunkings.
#![allow(dead_code)]

use uistream::streaming::{StreamDecoder, Utf8StreamDecoder};
use uistream::types::{StreamEvent, ToolCallRecord};

/// Everything observable after decoding a whole stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub events: Vec<StreamEvent>,
    pub text: String,
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Load a fixture from `tests/fixtures/ui_stream/`.
pub fn load_fixture(name: &str) -> String {
    let path = format!(
        "{}/tests/fixtures/ui_stream/{name}",
        env!("CARGO_MANIFEST_DIR")
    );
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("load fixture {path}: {e}"))
}

/// Feed text fragments in order, then flush.
pub fn decode_text_chunks<'a>(chunks: impl IntoIterator<Item = &'a str>) -> Decoded {
    let mut decoder = StreamDecoder::new();
    let mut events = Vec::new();
    for chunk in chunks {
        decoder.feed(chunk, |e| events.push(e));
    }
    decoder.flush(|e| events.push(e));
    Decoded {
        events,
        text: decoder.accumulated_text().to_string(),
        tool_calls: decoder.tool_calls(),
    }
}

/// Decode raw byte chunks through the UTF-8 stream decoder, then flush.
pub fn decode_byte_chunks<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Decoded {
    let mut utf8 = Utf8StreamDecoder::new();
    let mut decoder = StreamDecoder::new();
    let mut events = Vec::new();
    for chunk in chunks {
        let text = utf8.decode(chunk);
        decoder.feed(&text, |e| events.push(e));
    }
    let tail = utf8.finish();
    decoder.feed(&tail, |e| events.push(e));
    decoder.flush(|e| events.push(e));
    Decoded {
        events,
        text: decoder.accumulated_text().to_string(),
        tool_calls: decoder.tool_calls(),
    }
}

/// Split `bytes` at the given cut points. Cuts are sorted, deduplicated and
/// clamped to the slice.
pub fn split_bytes<'a>(bytes: &'a [u8], cuts: &[usize]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = cuts.iter().map(|c| (*c).min(bytes.len())).collect();
    cuts.sort_unstable();
    cuts.dedup();
    let mut out = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        out.push(&bytes[start..cut]);
        start = cut;
    }
    out.push(&bytes[start..]);
    out
}

/// Split a string at char boundaries nearest to the given byte cut points.
pub fn split_text<'a>(text: &'a str, cuts: &[usize]) -> Vec<&'a str> {
    let snapped: Vec<usize> = cuts
        .iter()
        .map(|c| {
            let mut c = (*c).min(text.len());
            while !text.is_char_boundary(c) {
                c -= 1;
            }
            c
        })
        .collect();
    split_bytes(text.as_bytes(), &snapped)
        .into_iter()
        .map(|b| std::str::from_utf8(b).expect("cuts are on char boundaries"))
        .collect()
}
