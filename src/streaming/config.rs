//! Decoder configuration.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Knobs for [`StreamDecoder`](super::StreamDecoder).
///
/// The defaults match the producer vocabulary this crate targets; the lists
/// are open so a producer adding lifecycle markers does not need a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// `data` values that mean "finished, no usage". Compared after trimming.
    pub done_markers: Vec<String>,
    /// Event names consumed without emitting anything.
    pub ignored_events: Vec<String>,
    /// When a frame has no `event:` line, read its kind from the JSON
    /// body's `type` field.
    pub infer_type_from_body: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            done_markers: vec![defaults::decoder::DONE_MARKER.to_string()],
            ignored_events: defaults::decoder::IGNORED_EVENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            infer_type_from_body: true,
        }
    }
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_done_marker(mut self, marker: impl Into<String>) -> Self {
        self.done_markers.push(marker.into());
        self
    }

    pub fn with_ignored_event(mut self, name: impl Into<String>) -> Self {
        self.ignored_events.push(name.into());
        self
    }

    pub fn with_infer_type_from_body(mut self, enabled: bool) -> Self {
        self.infer_type_from_body = enabled;
        self
    }

    pub(crate) fn is_done_marker(&self, data: &str) -> bool {
        let data = data.trim();
        self.done_markers.iter().any(|m| m == data)
    }

    pub(crate) fn is_ignored(&self, name: &str) -> bool {
        self.ignored_events.iter().any(|e| e == name)
    }
}
