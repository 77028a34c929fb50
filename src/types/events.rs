//! Decoded stream events.

use serde::{Deserialize, Serialize};

use super::{ToolCallRecord, ToolResult, Usage};

/// A producer-defined `<prefix>-<tag>` frame passed through uninterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    /// Event name with its leading `<prefix>-` removed
    pub tag: String,
    pub payload: serde_json::Value,
}

/// One decoded frame.
///
/// Events are transient: the decoder hands each one to its sink and keeps
/// nothing but the running text and tool-call state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    TextDelta {
        text: String,
    },
    /// Snapshot of the record at invocation time
    ToolInvoked(ToolCallRecord),
    ToolCompleted(ToolResult),
    Finished {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
    Failed {
        message: String,
    },
    Custom(CustomEvent),
}

impl StreamEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    /// Finish without reason or usage, as produced by the `[DONE]` sentinel.
    pub fn done() -> Self {
        Self::Finished {
            finish_reason: None,
            usage: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextDelta { .. } => "text-delta",
            Self::ToolInvoked(_) => "tool-invoked",
            Self::ToolCompleted(_) => "tool-completed",
            Self::Finished { .. } => "finished",
            Self::Failed { .. } => "failed",
            Self::Custom(_) => "custom",
        }
    }
}
