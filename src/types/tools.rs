//! Tool call records tracked across a stream.

use serde::{Deserialize, Serialize};

/// Name given to records synthesized from an output whose input never arrived.
pub const UNKNOWN_TOOL_NAME: &str = "unknown";

/// Lifecycle of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCallState {
    /// Input observed, output pending
    Invoked,
    /// Output observed
    Completed,
}

/// One tool invocation, keyed by its call id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    pub state: ToolCallState,
    /// Set when the record was created from an output frame for an id whose
    /// input frame was never seen. `name` is then [`UNKNOWN_TOOL_NAME`] and
    /// `input` is `null`.
    #[serde(default)]
    pub synthesized: bool,
}

impl ToolCallRecord {
    pub fn invoked(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            output: None,
            state: ToolCallState::Invoked,
            synthesized: false,
        }
    }

    pub(crate) fn synthesized(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: UNKNOWN_TOOL_NAME.to_string(),
            input: serde_json::Value::Null,
            output: None,
            state: ToolCallState::Invoked,
            synthesized: true,
        }
    }

    pub(crate) fn complete(&mut self, output: serde_json::Value) {
        self.output = Some(output);
        self.state = ToolCallState::Completed;
    }

    pub fn is_completed(&self) -> bool {
        self.state == ToolCallState::Completed
    }
}

/// Transcript entry for a tool call, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPart {
    pub call_id: String,
    pub name: String,
    pub state: ToolCallState,
    pub input: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

impl From<&ToolCallRecord> for ToolPart {
    fn from(record: &ToolCallRecord) -> Self {
        Self {
            call_id: record.id.clone(),
            name: record.name.clone(),
            state: record.state,
            input: record.input.clone(),
            output: record.output.clone(),
        }
    }
}

/// Output of a completed tool call as handed to `on_tool_result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub call_id: String,
    pub output: serde_json::Value,
}
