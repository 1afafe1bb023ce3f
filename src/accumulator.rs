//! Part accumulation for streamed assistant replies.
//!
//! The accumulator turns one run event into one mutation of an ordered list
//! of parts. It only keeps cursors into the list (the open text part, the
//! open reasoning part, and a tool call id to position index); the parts
//! themselves stay owned by the message being built.

use std::collections::HashMap;

use crate::error::{IntegrityError, ProviderError};
use crate::events::RunEventKind;
use crate::models::{Message, Part, ToolCallPart};

/// Result of applying one event
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Parts changed
    Mutated,
    /// Event carried no part mutation (system, title)
    Unchanged,
    /// Event was rejected; parts untouched
    Dropped(IntegrityError),
    /// Backend reported a terminal error; parts untouched
    Failed(ProviderError),
    /// Parts were replaced with the server-confirmed message
    Completed(Box<Message>),
}

/// Cursor state for folding events into a part list
#[derive(Debug, Default, Clone)]
pub struct PartAccumulator {
    open_text: Option<usize>,
    open_reasoning: Option<usize>,
    tool_index: HashMap<String, usize>,
}

impl PartAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild cursors for an existing part list so further events continue it
    pub fn resume(parts: &[Part]) -> Self {
        let mut accumulator = Self::new();
        accumulator.reindex(parts);
        accumulator
    }

    /// Apply one event to `parts`
    pub fn apply(&mut self, parts: &mut Vec<Part>, event: &RunEventKind) -> Applied {
        match event {
            RunEventKind::TextDelta { delta, .. } => {
                self.push_text(parts, delta);
                Applied::Mutated
            }
            RunEventKind::ReasoningDelta { delta, .. } => {
                self.push_reasoning(parts, delta);
                Applied::Mutated
            }
            RunEventKind::ToolCall { tool_call, .. } => {
                if self.tool_index.contains_key(&tool_call.id) {
                    let fault = IntegrityError::DuplicateToolCall {
                        tool_call_id: tool_call.id.clone(),
                    };
                    tracing::warn!(%fault, "dropping tool call");
                    return Applied::Dropped(fault);
                }
                self.open_text = None;
                self.open_reasoning = None;
                self.tool_index.insert(tool_call.id.clone(), parts.len());
                parts.push(Part::ToolCall(ToolCallPart::new(
                    tool_call.id.clone(),
                    tool_call.name.clone(),
                    tool_call.arguments.clone(),
                )));
                Applied::Mutated
            }
            RunEventKind::ToolResult { tool_result, .. } => {
                let target = self
                    .tool_index
                    .get(&tool_result.tool_call_id)
                    .and_then(|&index| parts.get_mut(index));
                match target {
                    Some(Part::ToolCall(call)) => {
                        if !call.is_pending() {
                            tracing::debug!(
                                tool_call_id = %call.tool_call_id,
                                "tool result arrived twice, keeping the latest"
                            );
                        }
                        let (result, meta) = tool_result.clone().into_result();
                        call.attach_result(result, meta);
                        Applied::Mutated
                    }
                    _ => {
                        let fault = IntegrityError::UnknownToolCall {
                            tool_call_id: tool_result.tool_call_id.clone(),
                        };
                        tracing::warn!(%fault, "dropping tool result");
                        Applied::Dropped(fault)
                    }
                }
            }
            RunEventKind::Error { code, message, .. } => {
                Applied::Failed(ProviderError::new(code.clone(), message.clone()))
            }
            RunEventKind::Done { final_message, .. } => {
                *parts = final_message.parts.clone();
                self.reindex(parts);
                Applied::Completed(Box::new(final_message.clone()))
            }
            RunEventKind::System { .. } | RunEventKind::ThreadTitleUpdated { .. } => {
                Applied::Unchanged
            }
        }
    }

    fn push_text(&mut self, parts: &mut Vec<Part>, delta: &str) {
        let last = parts.len().checked_sub(1);
        match (self.open_text, parts.last_mut()) {
            (Some(open), Some(Part::Text { content })) if Some(open) == last => {
                content.push_str(delta);
            }
            _ => {
                parts.push(Part::text(delta));
                self.open_text = Some(parts.len() - 1);
            }
        }
        self.open_reasoning = None;
    }

    fn push_reasoning(&mut self, parts: &mut Vec<Part>, delta: &str) {
        let last = parts.len().checked_sub(1);
        match (self.open_reasoning, parts.last_mut()) {
            (Some(open), Some(Part::Reasoning { content })) if Some(open) == last => {
                content.push_str(delta);
            }
            _ => {
                parts.push(Part::reasoning(delta));
                self.open_reasoning = Some(parts.len() - 1);
            }
        }
        self.open_text = None;
    }

    fn reindex(&mut self, parts: &[Part]) {
        self.tool_index = parts
            .iter()
            .enumerate()
            .filter_map(|(index, part)| {
                part.as_tool_call()
                    .map(|call| (call.tool_call_id.clone(), index))
            })
            .collect();
        let last = parts.len().checked_sub(1);
        self.open_text = match parts.last() {
            Some(Part::Text { .. }) => last,
            _ => None,
        };
        self.open_reasoning = match parts.last() {
            Some(Part::Reasoning { .. }) => last,
            _ => None,
        };
    }
}

/// Fold a whole event sequence into a fresh part list
pub fn accumulate<'a>(events: impl IntoIterator<Item = &'a RunEventKind>) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut accumulator = PartAccumulator::new();
    for event in events {
        accumulator.apply(&mut parts, event);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ToolCallPayload, ToolResultPayload};
    use crate::models::MessageRole;
    use serde_json::json;

    fn text(delta: &str) -> RunEventKind {
        RunEventKind::TextDelta {
            message_id: "m1".to_string(),
            delta: delta.to_string(),
        }
    }

    fn reasoning(delta: &str) -> RunEventKind {
        RunEventKind::ReasoningDelta {
            message_id: "m1".to_string(),
            delta: delta.to_string(),
        }
    }

    fn tool_call(id: &str, name: &str) -> RunEventKind {
        RunEventKind::ToolCall {
            message_id: "m1".to_string(),
            tool_call: ToolCallPayload {
                id: id.to_string(),
                name: name.to_string(),
                arguments: json!({}),
            },
        }
    }

    fn tool_result(id: &str) -> RunEventKind {
        RunEventKind::ToolResult {
            message_id: "m1".to_string(),
            tool_result: ToolResultPayload {
                tool_call_id: id.to_string(),
                success: true,
                data: Some(json!({"holdings": [{"ticker": "AAPL"}]})),
                error: None,
                meta: Some(json!({"render": "table"})),
            },
        }
    }

    #[test]
    fn test_text_deltas_concatenate_in_order() {
        let events = vec![text("Rust "), text("is "), text("fast.")];
        let parts = accumulate(&events);
        assert_eq!(parts, vec![Part::text("Rust is fast.")]);
    }

    #[test]
    fn test_reasoning_deltas_coalesce() {
        let events = vec![reasoning("Think"), reasoning("ing")];
        assert_eq!(accumulate(&events), vec![Part::reasoning("Thinking")]);
    }

    #[test]
    fn test_interleave_never_merges_across_tool_call() {
        let events = vec![text("A"), tool_call("tc1", "lookup"), text("B")];
        let parts = accumulate(&events);

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], Part::text("A"));
        assert_eq!(parts[1].as_tool_call().unwrap().tool_call_id, "tc1");
        assert_eq!(parts[2], Part::text("B"));
    }

    #[test]
    fn test_reasoning_between_text_opens_fresh_text() {
        let events = vec![text("A"), reasoning("hmm"), text("B")];
        let parts = accumulate(&events);
        assert_eq!(
            parts,
            vec![Part::text("A"), Part::reasoning("hmm"), Part::text("B")]
        );
    }

    #[test]
    fn test_tool_result_attaches_in_place() {
        let events = vec![tool_call("tc1", "get_holdings"), tool_result("tc1")];
        let parts = accumulate(&events);

        assert_eq!(parts.len(), 1);
        let call = parts[0].as_tool_call().unwrap();
        assert!(call.result.as_ref().unwrap().success);
        assert_eq!(call.meta, Some(json!({"render": "table"})));
    }

    #[test]
    fn test_unmatched_tool_result_is_dropped() {
        let mut parts = vec![Part::text("hello")];
        let mut accumulator = PartAccumulator::resume(&parts);

        let applied = accumulator.apply(&mut parts, &tool_result("missing"));

        assert_eq!(
            applied,
            Applied::Dropped(IntegrityError::UnknownToolCall {
                tool_call_id: "missing".to_string()
            })
        );
        assert_eq!(parts, vec![Part::text("hello")]);
    }

    #[test]
    fn test_duplicate_tool_call_is_dropped() {
        let mut parts = Vec::new();
        let mut accumulator = PartAccumulator::new();
        accumulator.apply(&mut parts, &tool_call("tc1", "a"));

        let applied = accumulator.apply(&mut parts, &tool_call("tc1", "b"));

        assert!(matches!(applied, Applied::Dropped(IntegrityError::DuplicateToolCall { .. })));
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn test_error_does_not_mutate_parts() {
        let mut parts = vec![Part::text("partial")];
        let mut accumulator = PartAccumulator::resume(&parts);
        let event = RunEventKind::Error {
            code: "overloaded".to_string(),
            message: "busy".to_string(),
            message_id: None,
        };

        let applied = accumulator.apply(&mut parts, &event);

        assert_eq!(applied, Applied::Failed(ProviderError::new("overloaded", "busy")));
        assert_eq!(parts, vec![Part::text("partial")]);
    }

    #[test]
    fn test_done_replaces_parts_with_canonical_message() {
        let mut parts = Vec::new();
        let mut accumulator = PartAccumulator::new();
        accumulator.apply(&mut parts, &text("Let me chek"));

        let final_message = Message {
            id: "m1".to_string(),
            role: MessageRole::Assistant,
            parts: vec![Part::text("Let me check")],
            created_at: chrono::Utc::now(),
            status: Default::default(),
            notice: None,
        };
        let applied = accumulator.apply(
            &mut parts,
            &RunEventKind::Done {
                message_id: "m1".to_string(),
                final_message: final_message.clone(),
                usage: None,
            },
        );

        assert_eq!(applied, Applied::Completed(Box::new(final_message)));
        assert_eq!(parts, vec![Part::text("Let me check")]);
    }

    #[test]
    fn test_resume_continues_open_text() {
        let mut parts = vec![Part::reasoning("plan"), Part::text("Hel")];
        let mut accumulator = PartAccumulator::resume(&parts);
        accumulator.apply(&mut parts, &text("lo"));
        assert_eq!(parts, vec![Part::reasoning("plan"), Part::text("Hello")]);
    }

    #[test]
    fn test_system_and_title_are_unchanged() {
        let mut parts = Vec::new();
        let mut accumulator = PartAccumulator::new();
        let system = RunEventKind::System {
            message_id: "m1".to_string(),
        };
        let title = RunEventKind::ThreadTitleUpdated {
            title: "Holdings".to_string(),
        };
        assert_eq!(accumulator.apply(&mut parts, &system), Applied::Unchanged);
        assert_eq!(accumulator.apply(&mut parts, &title), Applied::Unchanged);
        assert!(parts.is_empty());
    }
}
