use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_nullable_string};

/// Represents a conversation thread summary from persistence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    /// Unique identifier from backend (can be string or integer)
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Thread title (API may send as "name")
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_string",
        alias = "name"
    )]
    pub title: String,
    /// Whether the thread is pinned to the top of the list
    #[serde(default, alias = "pinned")]
    pub is_pinned: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Last activity (server may send as "last_activity")
    #[serde(default = "Utc::now", alias = "last_activity")]
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    /// Create an unpinned thread with no tags
    pub fn new(id: impl Into<String>, title: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_pinned: false,
            tags: Vec::new(),
            updated_at,
        }
    }
}

/// Query for one page of the thread list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Opaque cursor returned by the previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub limit: usize,
    /// Title search filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListQuery {
    /// First page with the given size
    pub fn first(limit: usize) -> Self {
        Self {
            cursor: None,
            limit,
            search: None,
        }
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|s| !s.trim().is_empty());
        self
    }
}

/// One page of thread summaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadPage {
    pub threads: Vec<Thread>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Truncate the opening user message into a placeholder title.
///
/// Keeps at most `max_chars` characters (never splitting a UTF-8 sequence)
/// and appends an ellipsis when anything was cut.
pub fn placeholder_title(first_message: &str, max_chars: usize) -> String {
    let trimmed = first_message.trim();
    let single_line = trimmed.lines().next().unwrap_or_default();
    match single_line.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", single_line[..end].trim_end()),
        None if single_line.len() < trimmed.len() => format!("{}...", single_line.trim_end()),
        None => single_line.to_string(),
    }
}
