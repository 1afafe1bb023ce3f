//! Stateful SSE parser producing run events

use serde_json::Value;

use crate::events::RunEvent;

use super::events::{SseLine, SseParseError};

/// Event types the runtime understands. Anything else is skipped.
const RUN_EVENT_TYPES: &[&str] = &[
    "system",
    "text_delta",
    "reasoning_delta",
    "tool_call",
    "tool_result",
    "thread_title_updated",
    "error",
    "done",
];

/// Parse a single SSE line into its component type
pub fn parse_sse_line(line: &str) -> SseLine {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.trim().to_string());
    }

    SseLine::Comment(line.to_string())
}

/// Decode one event payload.
///
/// The `type` field inside the JSON wins; an explicit `event:` line fills it
/// in when the payload omits it. Keepalives and unknown types yield `None`.
pub fn parse_run_event(event_type: &str, data: &str) -> Result<Option<RunEvent>, SseParseError> {
    if event_type == "ping" {
        return Ok(None);
    }

    let mut value: Value = serde_json::from_str(data).map_err(|e| SseParseError::InvalidJson {
        event_type: event_type.to_string(),
        source: e.to_string(),
    })?;

    if let Value::Object(map) = &mut value {
        if !map.contains_key("type") {
            map.insert("type".to_string(), Value::String(event_type.to_string()));
        }
    }

    let resolved = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(event_type)
        .to_string();
    if !RUN_EVENT_TYPES.contains(&resolved.as_str()) {
        tracing::debug!(event_type = %resolved, "ignoring unknown SSE event");
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| SseParseError::InvalidJson {
            event_type: resolved,
            source: e.to_string(),
        })
}

/// Stateful SSE parser that accumulates lines and emits complete events
#[derive(Debug, Default)]
pub struct SseParser {
    /// Current event type being accumulated
    current_event_type: Option<String>,
    /// Accumulated data lines (SSE allows multiple data: lines)
    data_buffer: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a line to the parser, potentially returning a complete event
    ///
    /// Returns:
    /// - `Ok(Some(event))` - A complete event was parsed
    /// - `Ok(None)` - Line was consumed but event is incomplete or skipped
    /// - `Err(error)` - Parse error occurred
    pub fn feed_line(&mut self, line: &str) -> Result<Option<RunEvent>, SseParseError> {
        match parse_sse_line(line) {
            SseLine::Event(event_type) => {
                self.current_event_type = Some(event_type);
                Ok(None)
            }
            SseLine::Data(data) => {
                self.data_buffer.push(data);
                Ok(None)
            }
            SseLine::Empty => self.try_emit_event(),
            SseLine::Comment(_) => Ok(None),
        }
    }

    fn try_emit_event(&mut self) -> Result<Option<RunEvent>, SseParseError> {
        if self.current_event_type.is_none() && self.data_buffer.is_empty() {
            return Ok(None);
        }

        let event_type = self.current_event_type.take();
        let data = self.data_buffer.join("\n");
        self.data_buffer.clear();

        match event_type {
            Some(et) if et == "ping" => Ok(None),
            Some(et) if data.is_empty() => Err(SseParseError::MissingData { event_type: et }),
            Some(et) => parse_run_event(&et, &data),
            None => parse_run_event("", &data),
        }
    }

    /// Whether a partially accumulated event is pending
    pub fn has_pending(&self) -> bool {
        self.current_event_type.is_some() || !self.data_buffer.is_empty()
    }

    pub fn reset(&mut self) {
        self.current_event_type = None;
        self.data_buffer.clear();
    }
}
