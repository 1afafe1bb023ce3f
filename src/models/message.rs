use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tools::ToolCallPart;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Tool,
}

/// An ordered, typed segment of message content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text content
    Text { content: String },
    /// Reasoning/thinking content
    Reasoning { content: String },
    /// A tool invocation with its result once available
    ToolCall(ToolCallPart),
}

impl Part {
    /// Create a text part
    pub fn text(content: impl Into<String>) -> Self {
        Part::Text {
            content: content.into(),
        }
    }

    /// Create a reasoning part
    pub fn reasoning(content: impl Into<String>) -> Self {
        Part::Reasoning {
            content: content.into(),
        }
    }

    /// Get the tool call if this part is one
    pub fn as_tool_call(&self) -> Option<&ToolCallPart> {
        match self {
            Part::ToolCall(call) => Some(call),
            _ => None,
        }
    }

    /// Text content of a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { content } => Some(content),
            _ => None,
        }
    }
}

/// Lifecycle of a message in the transcript
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Final content, either streamed to completion or loaded from persistence
    #[default]
    Complete,
    /// Assistant reply currently being built by a run
    Streaming,
    /// Halted in place by the user
    Cancelled,
    /// Run terminated by a transport or provider error
    Failed,
}

/// Kind of terminal note attached to a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Quiet marker for a reply stopped by the user
    Cancelled,
    /// User-visible failure note
    Error,
}

/// Terminal, user-visible note appended to an assistant message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    /// Short machine-readable code (e.g. "rate_limited", "stream_ended")
    pub code: String,
    /// Human-readable text shown in the transcript
    pub message: String,
}

impl Notice {
    /// Create an error notice
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create the cancellation marker
    pub fn cancelled() -> Self {
        Self {
            kind: NoticeKind::Cancelled,
            code: "cancelled".to_string(),
            message: "Response stopped.".to_string(),
        }
    }
}

/// A message in the working transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Message id: local UUID until the backend assigns its own
    pub id: String,
    /// Role of the message sender
    pub role: MessageRole,
    /// Ordered content parts
    #[serde(default)]
    pub parts: Vec<Part>,
    /// When the message was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: MessageStatus,
    /// Terminal note (error or cancellation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl Message {
    /// Create a completed user message with a single text part
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::User,
            parts: vec![Part::text(content)],
            created_at: Utc::now(),
            status: MessageStatus::Complete,
            notice: None,
        }
    }

    /// Create the empty assistant placeholder a run streams into
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            parts: Vec::new(),
            created_at: Utc::now(),
            status: MessageStatus::Streaming,
            notice: None,
        }
    }

    /// Whether the message is being streamed
    pub fn is_streaming(&self) -> bool {
        self.status == MessageStatus::Streaming
    }

    /// A message is empty when it has neither parts nor a notice
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.notice.is_none()
    }

    /// Concatenated text of all text parts
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }

    /// Find a tool call part by id
    pub fn tool_call(&self, tool_call_id: &str) -> Option<&ToolCallPart> {
        self.parts
            .iter()
            .filter_map(Part::as_tool_call)
            .find(|call| call.tool_call_id == tool_call_id)
    }

    /// Mark the message cancelled, leaving streamed parts in place
    pub fn cancel(&mut self) {
        if !self.is_streaming() {
            return;
        }
        self.status = MessageStatus::Cancelled;
        if self.parts.is_empty() {
            self.notice = Some(Notice::cancelled());
        }
    }

    /// Mark the message failed and attach the error note
    pub fn fail(&mut self, notice: Notice) {
        self.status = MessageStatus::Failed;
        self.notice = Some(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message_has_text_part() {
        let message = Message::user("Show my holdings");
        assert_eq!(message.role, MessageRole::User);
        assert_eq!(message.text(), "Show my holdings");
        assert_eq!(message.status, MessageStatus::Complete);
    }

    #[test]
    fn test_placeholder_is_streaming_and_empty() {
        let message = Message::assistant_placeholder();
        assert!(message.is_streaming());
        assert!(message.is_empty());
    }

    #[test]
    fn test_cancel_empty_placeholder_adds_notice() {
        let mut message = Message::assistant_placeholder();
        message.cancel();

        assert_eq!(message.status, MessageStatus::Cancelled);
        assert_eq!(message.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Cancelled));
        assert!(!message.is_empty());
    }

    #[test]
    fn test_cancel_keeps_parts_without_notice() {
        let mut message = Message::assistant_placeholder();
        message.parts.push(Part::text("partial"));
        message.cancel();

        assert_eq!(message.status, MessageStatus::Cancelled);
        assert!(message.notice.is_none());
        assert_eq!(message.text(), "partial");
    }

    #[test]
    fn test_cancel_is_noop_on_complete_message() {
        let mut message = Message::user("hi");
        message.cancel();
        assert_eq!(message.status, MessageStatus::Complete);
    }

    #[test]
    fn test_part_serde_tagging() {
        let part = Part::ToolCall(ToolCallPart::new("tc1", "get_holdings", json!({})));
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["type"], "tool_call");
        assert_eq!(value["tool_call_id"], "tc1");

        let text: Part = serde_json::from_value(json!({"type": "text", "content": "hi"})).unwrap();
        assert_eq!(text, Part::text("hi"));
    }
}
