//! Persistence-side message shape and its conversion into transcript messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accumulator::{Applied, PartAccumulator};
use crate::events::{RunEventKind, ToolCallPayload, ToolResultPayload};

use super::{deserialize_id, Message, MessageRole, MessageStatus, Part};

/// Content block as stored by persistence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Reasoning {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        success: bool,
        #[serde(default)]
        data: Option<serde_json::Value>,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        meta: Option<serde_json::Value>,
    },
}

/// Finalized message as returned by `load_thread_messages`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredMessage {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ContentBlock {
    /// Append the block to `parts`.
    ///
    /// Every stored text or reasoning block is its own part. Tool blocks go
    /// through the accumulator so results land on their calls.
    fn append_to(
        self,
        message_id: &str,
        parts: &mut Vec<Part>,
        accumulator: &mut PartAccumulator,
    ) -> Applied {
        let message_id = message_id.to_string();
        let event = match self {
            ContentBlock::Text { text } => {
                parts.push(Part::text(text));
                return Applied::Mutated;
            }
            ContentBlock::Reasoning { text } => {
                parts.push(Part::reasoning(text));
                return Applied::Mutated;
            }
            ContentBlock::ToolUse { id, name, input } => RunEventKind::ToolCall {
                message_id,
                tool_call: ToolCallPayload {
                    id,
                    name,
                    arguments: input,
                },
            },
            ContentBlock::ToolResult {
                tool_use_id,
                success,
                data,
                error,
                meta,
            } => RunEventKind::ToolResult {
                message_id,
                tool_result: ToolResultPayload {
                    tool_call_id: tool_use_id,
                    success,
                    data,
                    error,
                    meta,
                },
            },
        };
        accumulator.apply(parts, &event)
    }
}

/// Convert a thread's stored history into transcript messages.
///
/// Stored blocks map one to one onto parts; tool calls and results are
/// paired with the same accumulator that builds streamed replies. Tool-role
/// messages only carry results: they are folded into the preceding assistant
/// message and do not appear in the output.
pub fn hydrate_messages(stored: Vec<StoredMessage>) -> Vec<Message> {
    let mut messages: Vec<Message> = Vec::with_capacity(stored.len());
    // Accumulator of the most recent assistant message, kept so that results
    // stored in a following tool message land on their calls.
    let mut assistant: Option<(usize, PartAccumulator)> = None;

    for stored_message in stored {
        if stored_message.role == MessageRole::Tool {
            let Some((index, accumulator)) = assistant.as_mut() else {
                tracing::warn!(
                    message_id = %stored_message.id,
                    "tool message without a preceding assistant message, skipping"
                );
                continue;
            };
            let target = &mut messages[*index];
            for block in stored_message.blocks {
                if let Applied::Dropped(fault) =
                    block.append_to(&target.id, &mut target.parts, accumulator)
                {
                    tracing::debug!(message_id = %target.id, %fault, "dropped stored result");
                }
            }
            continue;
        }

        let mut message = Message {
            id: stored_message.id,
            role: stored_message.role,
            parts: Vec::new(),
            created_at: stored_message.created_at,
            status: MessageStatus::Complete,
            notice: None,
        };
        let mut accumulator = PartAccumulator::new();
        for block in stored_message.blocks {
            if let Applied::Dropped(fault) =
                block.append_to(&message.id, &mut message.parts, &mut accumulator)
            {
                tracing::debug!(message_id = %message.id, %fault, "dropped stored block");
            }
        }

        let is_assistant = message.role == MessageRole::Assistant;
        messages.push(message);
        assistant = if is_assistant {
            Some((messages.len() - 1, accumulator))
        } else {
            None
        };
    }

    messages
}
