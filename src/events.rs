//! Run event types consumed from the event source.
//!
//! Every event carries the thread id and run id of the run that produced it,
//! plus one of the kinds below. Events for one message id arrive in
//! production order and are never reordered downstream.

use serde::{Deserialize, Serialize};

use crate::models::{Message, ToolResult};

/// Tool invocation announced by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Tool outcome reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResultPayload {
    pub tool_call_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl ToolResultPayload {
    /// Split into the stored result and its rendering meta
    pub fn into_result(self) -> (ToolResult, Option<serde_json::Value>) {
        (
            ToolResult {
                success: self.success,
                data: self.data,
                error: self.error,
            },
            self.meta,
        )
    }
}

/// Token accounting reported with `done`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Kind-specific payload of a run event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEventKind {
    /// The backend accepted the run and assigned the reply's message id
    System { message_id: String },
    /// Plain text fragment
    TextDelta { message_id: String, delta: String },
    /// Reasoning fragment
    ReasoningDelta { message_id: String, delta: String },
    /// Tool invocation
    ToolCall {
        message_id: String,
        tool_call: ToolCallPayload,
    },
    /// Tool outcome
    ToolResult {
        message_id: String,
        tool_result: ToolResultPayload,
    },
    /// Thread title generated or changed server-side
    ThreadTitleUpdated { title: String },
    /// Terminal failure reported by the backend
    Error {
        code: String,
        message: String,
        #[serde(default)]
        message_id: Option<String>,
    },
    /// Terminal success carrying the canonical message
    Done {
        message_id: String,
        final_message: Message,
        #[serde(default)]
        usage: Option<Usage>,
    },
}

impl RunEventKind {
    /// Returns the event type name as a string for debugging purposes.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            RunEventKind::System { .. } => "system",
            RunEventKind::TextDelta { .. } => "text_delta",
            RunEventKind::ReasoningDelta { .. } => "reasoning_delta",
            RunEventKind::ToolCall { .. } => "tool_call",
            RunEventKind::ToolResult { .. } => "tool_result",
            RunEventKind::ThreadTitleUpdated { .. } => "thread_title_updated",
            RunEventKind::Error { .. } => "error",
            RunEventKind::Done { .. } => "done",
        }
    }

    /// Whether this event ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEventKind::Error { .. } | RunEventKind::Done { .. })
    }

    /// Message id the event refers to, if any
    pub fn message_id(&self) -> Option<&str> {
        match self {
            RunEventKind::System { message_id }
            | RunEventKind::TextDelta { message_id, .. }
            | RunEventKind::ReasoningDelta { message_id, .. }
            | RunEventKind::ToolCall { message_id, .. }
            | RunEventKind::ToolResult { message_id, .. }
            | RunEventKind::Done { message_id, .. } => Some(message_id),
            RunEventKind::Error { message_id, .. } => message_id.as_deref(),
            RunEventKind::ThreadTitleUpdated { .. } => None,
        }
    }
}

/// One event of a run, as delivered by the event source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunEvent {
    pub thread_id: String,
    pub run_id: String,
    #[serde(flatten)]
    pub kind: RunEventKind,
}

impl RunEvent {
    pub fn new(thread_id: impl Into<String>, run_id: impl Into<String>, kind: RunEventKind) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            kind,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}
