//! Thread switching, thread list paging and reconciliation.

use std::sync::Arc;

use crate::models::ListQuery;

use super::{HistoryState, Phase, RuntimeMessage, SessionRuntime};

impl SessionRuntime {
    /// Make `thread_id` the current thread, or start a fresh conversation
    /// with `None`.
    ///
    /// Any streaming run is cancelled first. Switching to the thread that is
    /// already current and loading (or loaded) does nothing. Returns whether
    /// a switch happened.
    pub fn switch_thread(&mut self, thread_id: Option<String>) -> bool {
        self.cancel();

        if let Some(id) = &thread_id {
            let already_current = self.current_thread_id.as_deref() == Some(id.as_str());
            let settled_or_loading = matches!(
                self.history,
                HistoryState::Loading { .. } | HistoryState::Loaded
            ) || self.unconfirmed_thread.as_deref() == Some(id.as_str());
            if already_current && settled_or_loading {
                tracing::debug!(thread_id = %id, "already on thread");
                return false;
            }
        } else if self.current_thread_id.is_none() && self.messages.is_empty() {
            return false;
        }

        self.quiesce_run();
        self.switch_generation += 1;
        if let Some(task) = self.history_task.take() {
            task.abort();
        }

        self.messages.clear();
        self.last_error = None;
        self.unconfirmed_thread = None;
        self.current_thread_id = thread_id.clone();

        match thread_id {
            Some(id) => {
                let generation = self.switch_generation;
                self.history = HistoryState::Loading { generation };
                tracing::info!(thread_id = %id, generation, "switching thread");

                let store = Arc::clone(&self.store);
                let message_tx = self.message_tx.clone();
                self.history_task = Some(tokio::spawn(async move {
                    let result = store.load_thread_messages(&id).await;
                    let _ = message_tx.send(RuntimeMessage::HistoryLoaded {
                        generation,
                        thread_id: id,
                        result,
                    });
                }));
            }
            None => {
                self.history = HistoryState::Empty;
                tracing::info!("starting new conversation");
            }
        }

        self.flush();
        true
    }

    /// Clear the transcript and the current thread pointer.
    pub fn start_new_thread(&mut self) -> bool {
        self.switch_thread(None)
    }

    /// Load the first page of the thread list, optionally filtered by title.
    pub fn load_threads(&mut self, search: Option<String>) {
        let generation = self.cache.begin_load(search, false);
        let query = ListQuery::first(self.config.page_size)
            .with_search(self.cache.search().map(str::to_string));
        self.spawn_list_fetch(generation, query, false);
        self.mark_dirty();
    }

    /// Load the page after the loaded ones. Returns `false` when there is
    /// nothing more to load or a load is already in flight.
    pub fn load_more_threads(&mut self) -> bool {
        let Some(query) = self.cache.next_page_query(self.config.page_size) else {
            return false;
        };
        let generation = self.cache.begin_load(None, true);
        self.spawn_list_fetch(generation, query, true);
        self.mark_dirty();
        true
    }

    fn spawn_list_fetch(&mut self, generation: u64, query: ListQuery, append: bool) {
        if let Some(task) = self.list_task.take() {
            task.abort();
        }
        tracing::debug!(generation, append, limit = query.limit, "fetching thread list");

        let store = Arc::clone(&self.store);
        let message_tx = self.message_tx.clone();
        self.list_task = Some(tokio::spawn(async move {
            let result = store.list_threads(query).await;
            let _ = message_tx.send(RuntimeMessage::ThreadListLoaded {
                generation,
                append,
                result,
            });
        }));
    }

    /// Refetch the thread list after `reconcile_delay`, replacing any
    /// pending timer.
    pub(crate) fn schedule_reconcile(&mut self) {
        if let Some(timer) = self.reconcile_task.take() {
            timer.abort();
        }
        let delay = self.config.reconcile_delay;
        let message_tx = self.message_tx.clone();
        self.reconcile_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = message_tx.send(RuntimeMessage::ReconcileDue);
        }));
    }

    /// Replace the loaded pages with one fresh fetch of the same size.
    pub(crate) fn reconcile(&mut self) {
        self.reconcile_task = None;
        if self.phase == Phase::Streaming {
            // The run's own completion schedules the next one
            return;
        }
        let query = self.cache.reconcile_query(self.config.page_size);
        let search = self.cache.search().map(str::to_string);
        let generation = self.cache.begin_load(search, false);
        self.spawn_list_fetch(generation, query, false);
    }
}
