//! Common test utilities for integration tests.
//!
//! Event builders for scripted runs, stored-thread fixtures and a runtime
//! builder wired to the in-memory adapters.
//!
//! # Example
//!
//! ```ignore
//! let (mut runtime, source, store) = TestRuntime::new().build();
//! source.push(RunScript::new().events(holdings_reply("m1")));
//! runtime.submit("Show my holdings", Vec::new()).unwrap();
//! runtime.run_until_idle().await;
//! ```

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;

pub use threadline::adapters::{InMemoryThreadStore, RunScript, ScriptedEventSource};
use threadline::events::{RunEventKind, ToolCallPayload, ToolResultPayload};
use threadline::models::{ContentBlock, Message, MessageRole, MessageStatus, Part, StoredMessage, Thread};
use threadline::{RuntimeConfig, SessionRuntime};

pub fn system(message_id: &str) -> RunEventKind {
    RunEventKind::System {
        message_id: message_id.to_string(),
    }
}

pub fn text(message_id: &str, delta: &str) -> RunEventKind {
    RunEventKind::TextDelta {
        message_id: message_id.to_string(),
        delta: delta.to_string(),
    }
}

pub fn reasoning(message_id: &str, delta: &str) -> RunEventKind {
    RunEventKind::ReasoningDelta {
        message_id: message_id.to_string(),
        delta: delta.to_string(),
    }
}

pub fn tool_call(message_id: &str, id: &str, name: &str) -> RunEventKind {
    RunEventKind::ToolCall {
        message_id: message_id.to_string(),
        tool_call: ToolCallPayload {
            id: id.to_string(),
            name: name.to_string(),
            arguments: json!({}),
        },
    }
}

pub fn tool_result(message_id: &str, tool_call_id: &str, data: serde_json::Value) -> RunEventKind {
    RunEventKind::ToolResult {
        message_id: message_id.to_string(),
        tool_result: ToolResultPayload {
            tool_call_id: tool_call_id.to_string(),
            success: true,
            data: Some(data),
            error: None,
            meta: None,
        },
    }
}

pub fn title_updated(title: &str) -> RunEventKind {
    RunEventKind::ThreadTitleUpdated {
        title: title.to_string(),
    }
}

pub fn provider_error(code: &str, message: &str) -> RunEventKind {
    RunEventKind::Error {
        code: code.to_string(),
        message: message.to_string(),
        message_id: None,
    }
}

/// `done` carrying `parts` as the canonical message
pub fn done(message_id: &str, parts: Vec<Part>) -> RunEventKind {
    RunEventKind::Done {
        message_id: message_id.to_string(),
        final_message: Message {
            id: message_id.to_string(),
            role: MessageRole::Assistant,
            parts,
            created_at: Utc::now(),
            status: MessageStatus::Complete,
            notice: None,
        },
        usage: None,
    }
}

/// The "Show my holdings" reply: text, a tool call with its result, text.
///
/// Ends without `done` so callers can inspect the streamed parts.
pub fn holdings_deltas(message_id: &str) -> Vec<RunEventKind> {
    vec![
        system(message_id),
        text(message_id, "Let me "),
        text(message_id, "check "),
        tool_call(message_id, "tc1", "get_holdings"),
        tool_result(message_id, "tc1", json!({"holdings": [{"ticker": "AAPL", "shares": 10}]})),
        text(message_id, "your "),
        text(message_id, "holdings."),
    ]
}

pub fn thread(id: &str, title: &str, minutes_ago: i64) -> Thread {
    Thread::new(id, title, Utc::now() - ChronoDuration::minutes(minutes_ago))
}

pub fn stored_text(id: &str, role: MessageRole, text: &str) -> StoredMessage {
    StoredMessage {
        id: id.to_string(),
        role,
        blocks: vec![ContentBlock::Text {
            text: text.to_string(),
        }],
        created_at: Utc::now(),
    }
}

/// A two-message stored exchange
pub fn stored_exchange(prefix: &str) -> Vec<StoredMessage> {
    vec![
        stored_text(&format!("{}-u", prefix), MessageRole::User, "question"),
        stored_text(&format!("{}-a", prefix), MessageRole::Assistant, "answer"),
    ]
}

/// Builder for runtimes wired to the in-memory adapters
pub struct TestRuntime {
    config: RuntimeConfig,
    source: ScriptedEventSource,
    store: InMemoryThreadStore,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default()
                .with_publish_interval(Duration::from_millis(16))
                .with_reconcile_delay(Duration::from_millis(100)),
            source: ScriptedEventSource::new(),
            store: InMemoryThreadStore::new(),
        }
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_thread(self, thread: Thread, messages: Vec<StoredMessage>) -> Self {
        self.store.insert_thread(thread, messages);
        self
    }

    pub fn build(self) -> (SessionRuntime, ScriptedEventSource, InMemoryThreadStore) {
        let runtime = SessionRuntime::new(
            self.config,
            Arc::new(self.source.clone()),
            Arc::new(self.store.clone()),
        );
        (runtime, self.source, self.store)
    }
}

impl Default for TestRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive the runtime until `done` holds, with a step cap
pub async fn step_until(runtime: &mut SessionRuntime, mut done: impl FnMut(&SessionRuntime) -> bool) {
    for _ in 0..1_000 {
        if done(runtime) {
            return;
        }
        runtime.step().await;
    }
    panic!("condition not reached");
}
