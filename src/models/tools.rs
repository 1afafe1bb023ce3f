use serde::{Deserialize, Serialize};

/// Outcome of a tool invocation as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    /// Whether the tool completed successfully
    pub success: bool,
    /// Structured payload on success (holdings table, chart series, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Error text on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful result carrying `data`
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create a failed result carrying an error message
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Whether the result represents a failure
    pub fn is_error(&self) -> bool {
        !self.success
    }
}

/// A tool invocation and, once it arrives, its result.
///
/// The result is attached in place when the matching tool result event
/// arrives; a tool call never spawns a second part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallPart {
    /// Backend-assigned tool call id
    pub tool_call_id: String,
    /// Tool name (e.g. "get_holdings")
    pub name: String,
    /// Arguments the model passed to the tool
    #[serde(default)]
    pub arguments: serde_json::Value,
    /// Result, present once the tool finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ToolResult>,
    /// Opaque rendering hints from the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl ToolCallPart {
    /// Create a pending tool call without a result
    pub fn new(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            arguments,
            result: None,
            meta: None,
        }
    }

    /// Whether the tool is still waiting for its result
    pub fn is_pending(&self) -> bool {
        self.result.is_none()
    }

    /// Attach the result (and optional meta) in place
    pub fn attach_result(&mut self, result: ToolResult, meta: Option<serde_json::Value>) {
        self.result = Some(result);
        if meta.is_some() {
            self.meta = meta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_tool_call_is_pending() {
        let call = ToolCallPart::new("tc1", "get_holdings", json!({}));
        assert!(call.is_pending());
        assert!(call.meta.is_none());
    }

    #[test]
    fn test_attach_result_keeps_previous_meta_when_none() {
        let mut call = ToolCallPart::new("tc1", "get_holdings", json!({}));
        call.meta = Some(json!({"render": "table"}));

        call.attach_result(ToolResult::ok(json!({"holdings": []})), None);

        assert!(!call.is_pending());
        assert_eq!(call.meta, Some(json!({"render": "table"})));
    }

    #[test]
    fn test_failed_result() {
        let result = ToolResult::failed("upstream timeout");
        assert!(result.is_error());
        assert_eq!(result.error.as_deref(), Some("upstream timeout"));
        assert!(result.data.is_none());
    }

    #[test]
    fn test_tool_result_deserializes_without_optional_fields() {
        let result: ToolResult = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(result.success);
        assert!(result.data.is_none());
    }
}
