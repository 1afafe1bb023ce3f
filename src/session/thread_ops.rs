//! Thread metadata operations: rename, pin and delete.
//!
//! Each operation patches the cache right away and persists in the
//! background. Whatever the outcome, a reconciliation follows once the write
//! resolves; a failure also lands on the error side channel.

use std::sync::Arc;

use crate::error::{RuntimeError, StoreError};

use super::{RuntimeMessage, SessionRuntime, ThreadMutation};

impl SessionRuntime {
    pub fn rename(&mut self, thread_id: &str, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        self.cache.rename(thread_id, title);
        self.spawn_mutation(ThreadMutation::Rename {
            thread_id: thread_id.to_string(),
            title: title.to_string(),
        });
    }

    pub fn toggle_pin(&mut self, thread_id: &str, pinned: bool) {
        self.cache.set_pinned(thread_id, pinned);
        self.spawn_mutation(ThreadMutation::SetPinned {
            thread_id: thread_id.to_string(),
            pinned,
        });
    }

    /// Delete a thread. Deleting the current thread also starts a new one.
    pub fn delete(&mut self, thread_id: &str) {
        self.cache.remove(thread_id);
        if self.current_thread_id.as_deref() == Some(thread_id) {
            self.start_new_thread();
        }
        self.spawn_mutation(ThreadMutation::Delete {
            thread_id: thread_id.to_string(),
        });
    }

    fn spawn_mutation(&mut self, mutation: ThreadMutation) {
        tracing::debug!(
            op = mutation.name(),
            thread_id = %mutation.thread_id(),
            "persisting thread mutation"
        );
        self.mark_dirty();
        self.mutation_tasks.retain(|task| !task.is_finished());
        self.pending_mutations += 1;

        let store = Arc::clone(&self.store);
        let message_tx = self.message_tx.clone();
        self.mutation_tasks.push(tokio::spawn(async move {
            let result = match &mutation {
                ThreadMutation::Rename { thread_id, title } => store.rename(thread_id, title).await,
                ThreadMutation::SetPinned { thread_id, pinned } => {
                    store.set_pinned(thread_id, *pinned).await
                }
                ThreadMutation::Delete { thread_id } => store.delete(thread_id).await,
            };
            let _ = message_tx.send(RuntimeMessage::MutationFinished { mutation, result });
        }));
    }

    pub(crate) fn finish_mutation(
        &mut self,
        mutation: ThreadMutation,
        result: Result<(), StoreError>,
    ) {
        self.pending_mutations = self.pending_mutations.saturating_sub(1);
        match result {
            Ok(()) => {
                tracing::debug!(
                    op = mutation.name(),
                    thread_id = %mutation.thread_id(),
                    "thread mutation persisted"
                );
            }
            Err(err) => {
                tracing::warn!(
                    op = mutation.name(),
                    thread_id = %mutation.thread_id(),
                    error = %err,
                    "thread mutation failed"
                );
                self.last_error = Some(RuntimeError::Store(err));
                self.mark_dirty();
            }
        }
        self.schedule_reconcile();
    }
}
