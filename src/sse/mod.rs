//! SSE (Server-Sent Events) stream parser
//!
//! SSE format consists of:
//! - `event: <type>` - event type line
//! - `data: <json>` - data payload line
//! - Empty line - signals end of event
//! - Lines starting with `:` - comments (ignored)
//!
//! Payloads decode straight into [`RunEvent`](crate::events::RunEvent).

mod events;
mod parser;

pub use events::{SseLine, SseParseError};
pub use parser::{parse_run_event, parse_sse_line, SseParser};
