//! In-memory thread store for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{ListQuery, StoredMessage, Thread, ThreadPage};
use crate::traits::ThreadStore;

/// A recorded store call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    LoadMessages(String),
    ListThreads(ListQuery),
    Rename { thread_id: String, title: String },
    SetPinned { thread_id: String, pinned: bool },
    Delete(String),
}

#[derive(Debug, Default)]
struct StoreState {
    threads: Vec<Thread>,
    messages: HashMap<String, Vec<StoredMessage>>,
    load_delays: HashMap<String, Duration>,
    fail_next: Option<StoreError>,
    calls: Vec<StoreCall>,
}

/// Thread store backed by in-memory maps.
///
/// Listing sorts pinned first then by recency, filters by a case-insensitive
/// title match and pages with numeric offsets as cursors.
#[derive(Debug, Clone, Default)]
pub struct InMemoryThreadStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a thread and its stored history
    pub fn insert_thread(&self, thread: Thread, messages: Vec<StoredMessage>) {
        let mut state = self.lock();
        state.messages.insert(thread.id.clone(), messages);
        state.threads.retain(|t| t.id != thread.id);
        state.threads.push(thread);
    }

    /// Delay `load_thread_messages` for one thread
    pub fn set_load_delay(&self, thread_id: &str, delay: Duration) {
        self.lock().load_delays.insert(thread_id.to_string(), delay);
    }

    /// Fail the next call with `err`
    pub fn fail_next(&self, err: StoreError) {
        self.lock().fail_next = Some(err);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn load_count(&self, thread_id: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, StoreCall::LoadMessages(id) if id == thread_id))
            .count()
    }

    pub fn list_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, StoreCall::ListThreads(_)))
            .count()
    }

    pub fn thread(&self, thread_id: &str) -> Option<Thread> {
        self.lock()
            .threads
            .iter()
            .find(|t| t.id == thread_id)
            .cloned()
    }

    /// Record `call` and take the pending failure, if any
    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn update(&self, thread_id: &str, apply: impl FnOnce(&mut Thread)) -> Result<(), StoreError> {
        let mut state = self.lock();
        let thread = state
            .threads
            .iter_mut()
            .find(|t| t.id == thread_id)
            .ok_or_else(|| StoreError::NotFound {
                thread_id: thread_id.to_string(),
            })?;
        apply(thread);
        Ok(())
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn load_thread_messages(&self, thread_id: &str) -> Result<Vec<StoredMessage>, StoreError> {
        self.record(StoreCall::LoadMessages(thread_id.to_string()))?;

        let delay = self.lock().load_delays.get(thread_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.lock();
        match state.messages.get(thread_id) {
            Some(messages) => Ok(messages.clone()),
            None => Err(StoreError::NotFound {
                thread_id: thread_id.to_string(),
            }),
        }
    }

    async fn list_threads(&self, query: ListQuery) -> Result<ThreadPage, StoreError> {
        self.record(StoreCall::ListThreads(query.clone()))?;

        let state = self.lock();
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let mut threads: Vec<Thread> = state
            .threads
            .iter()
            .filter(|t| match &needle {
                Some(needle) => t.title.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();
        threads.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });

        let offset = query
            .cursor
            .as_deref()
            .and_then(|c| c.parse::<usize>().ok())
            .unwrap_or(0);
        let end = (offset + query.limit).min(threads.len());
        let page: Vec<Thread> = threads.get(offset..end).unwrap_or_default().to_vec();
        let has_more = end < threads.len();

        Ok(ThreadPage {
            threads: page,
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        })
    }

    async fn rename(&self, thread_id: &str, title: &str) -> Result<(), StoreError> {
        self.record(StoreCall::Rename {
            thread_id: thread_id.to_string(),
            title: title.to_string(),
        })?;
        self.update(thread_id, |t| t.title = title.to_string())
    }

    async fn set_pinned(&self, thread_id: &str, pinned: bool) -> Result<(), StoreError> {
        self.record(StoreCall::SetPinned {
            thread_id: thread_id.to_string(),
            pinned,
        })?;
        self.update(thread_id, |t| t.is_pinned = pinned)
    }

    async fn delete(&self, thread_id: &str) -> Result<(), StoreError> {
        self.record(StoreCall::Delete(thread_id.to_string()))?;
        let mut state = self.lock();
        let before = state.threads.len();
        state.threads.retain(|t| t.id != thread_id);
        state.messages.remove(thread_id);
        if state.threads.len() == before {
            return Err(StoreError::NotFound {
                thread_id: thread_id.to_string(),
            });
        }
        Ok(())
    }
}
