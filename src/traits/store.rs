//! Persistence gateway trait abstraction.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{ListQuery, StoredMessage, ThreadPage};

/// Trait for the durable side of threads and messages.
///
/// The runtime only reads messages back when switching threads; writes are
/// limited to thread metadata. Messages are persisted by the backend as part
/// of a run.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Load every stored message of a thread, oldest first.
    async fn load_thread_messages(&self, thread_id: &str) -> Result<Vec<StoredMessage>, StoreError>;

    /// Load one page of thread summaries.
    async fn list_threads(&self, query: ListQuery) -> Result<ThreadPage, StoreError>;

    async fn rename(&self, thread_id: &str, title: &str) -> Result<(), StoreError>;

    async fn set_pinned(&self, thread_id: &str, pinned: bool) -> Result<(), StoreError>;

    async fn delete(&self, thread_id: &str) -> Result<(), StoreError>;
}
