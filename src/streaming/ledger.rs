//! Tool-call ledger.
//!
//! A single insertion-ordered map backs both the keyed view (`get`) and the
//! transcript view (`parts`), so the two can never disagree.

use indexmap::IndexMap;

use crate::types::{ToolCallRecord, ToolPart};

/// Result of applying an output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The id had a record from an earlier input frame
    Known,
    /// No input was ever seen; a placeholder record was created
    Synthesized,
}

#[derive(Debug, Clone, Default)]
pub struct ToolCallLedger {
    calls: IndexMap<String, ToolCallRecord>,
}

impl ToolCallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an input frame. A repeated id overwrites the earlier record but
    /// keeps its transcript position.
    pub fn invoke(&mut self, record: ToolCallRecord) -> &ToolCallRecord {
        let entry = self.calls.entry(record.id.clone());
        match entry {
            indexmap::map::Entry::Occupied(mut slot) => {
                slot.insert(record);
                slot.into_mut()
            }
            indexmap::map::Entry::Vacant(slot) => slot.insert(record),
        }
    }

    /// Record an output frame, synthesizing a record for an unseen id.
    pub fn complete(
        &mut self,
        call_id: &str,
        output: serde_json::Value,
    ) -> (&ToolCallRecord, Completion) {
        let completion = if self.calls.contains_key(call_id) {
            Completion::Known
        } else {
            Completion::Synthesized
        };
        let record = self
            .calls
            .entry(call_id.to_string())
            .or_insert_with(|| ToolCallRecord::synthesized(call_id));
        record.complete(output);
        (&*record, completion)
    }

    pub fn get(&self, call_id: &str) -> Option<&ToolCallRecord> {
        self.calls.get(call_id)
    }

    /// Records in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.calls.values()
    }

    pub fn records(&self) -> Vec<ToolCallRecord> {
        self.calls.values().cloned().collect()
    }

    pub fn parts(&self) -> Vec<ToolPart> {
        self.calls.values().map(ToolPart::from).collect()
    }

    /// Calls whose output has not arrived yet.
    pub fn pending(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.calls.values().filter(|r| !r.is_completed())
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCallState;
    use serde_json::json;

    #[test]
    fn complete_updates_record_in_place() {
        let mut ledger = ToolCallLedger::new();
        ledger.invoke(ToolCallRecord::invoked("a", "lookup", json!({"q": 1})));
        ledger.invoke(ToolCallRecord::invoked("b", "search", json!({})));

        let (record, completion) = ledger.complete("a", json!({"ok": true}));
        assert_eq!(completion, Completion::Known);
        assert_eq!(record.state, ToolCallState::Completed);

        let parts = ledger.parts();
        assert_eq!(parts[0].call_id, "a");
        assert_eq!(parts[0].output, Some(json!({"ok": true})));
        assert_eq!(parts[1].state, ToolCallState::Invoked);
        assert_eq!(ledger.pending().count(), 1);
    }

    #[test]
    fn repeated_input_keeps_position() {
        let mut ledger = ToolCallLedger::new();
        ledger.invoke(ToolCallRecord::invoked("a", "one", json!(null)));
        ledger.invoke(ToolCallRecord::invoked("b", "two", json!(null)));
        ledger.invoke(ToolCallRecord::invoked("a", "three", json!(null)));

        let names: Vec<_> = ledger.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["three", "two"]);
    }

    #[test]
    fn unknown_output_is_synthesized_and_flagged() {
        let mut ledger = ToolCallLedger::new();
        let (record, completion) = ledger.complete("ghost", json!(42));
        assert_eq!(completion, Completion::Synthesized);
        assert!(record.synthesized);
        assert_eq!(record.name, crate::types::UNKNOWN_TOOL_NAME);
        assert_eq!(ledger.len(), 1);
    }
}
