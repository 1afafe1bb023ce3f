//! Message handling for the SessionRuntime.

use crate::accumulator::Applied;
use crate::error::{IntegrityError, RuntimeError, StoreError, TransportError};
use crate::events::{RunEvent, RunEventKind};
use crate::models::{hydrate_messages, StoredMessage, ThreadPage};

use super::{HistoryState, Phase, RuntimeMessage, SessionRuntime};

impl SessionRuntime {
    /// Apply a message sent back by a background task.
    pub fn handle_message(&mut self, msg: RuntimeMessage) {
        match msg {
            RuntimeMessage::RunEvent { run_id, event } => self.handle_run_event(&run_id, event),
            RuntimeMessage::RunFailed { run_id, error } => {
                if self.is_streaming_run(&run_id) {
                    self.fail_run(error.into());
                } else {
                    tracing::debug!(
                        run_id = %run_id,
                        error = %error,
                        "ignoring failure of inactive run"
                    );
                }
            }
            RuntimeMessage::RunEnded { run_id } => self.handle_run_ended(&run_id),
            RuntimeMessage::HistoryLoaded {
                generation,
                thread_id,
                result,
            } => self.handle_history_loaded(generation, &thread_id, result),
            RuntimeMessage::ThreadListLoaded {
                generation,
                append,
                result,
            } => self.handle_thread_list_loaded(generation, append, result),
            RuntimeMessage::ReconcileDue => self.reconcile(),
            RuntimeMessage::MutationFinished { mutation, result } => {
                self.finish_mutation(mutation, result)
            }
        }
    }

    fn is_streaming_run(&self, run_id: &str) -> bool {
        self.phase == Phase::Streaming && self.active_run_id() == Some(run_id)
    }

    fn handle_run_event(&mut self, pump_run_id: &str, event: RunEvent) {
        // Guard: late events of a cancelled, settled or replaced run
        if !self.is_streaming_run(pump_run_id) {
            tracing::debug!(
                run_id = %pump_run_id,
                event_type = event.kind.event_type_name(),
                "discarding event for inactive run"
            );
            return;
        }
        let Some(run) = self.run.as_mut() else {
            return;
        };

        if event.run_id != run.run_id {
            let fault = IntegrityError::RunMismatch {
                expected: run.run_id.clone(),
                actual: event.run_id.clone(),
            };
            tracing::warn!(%fault, "dropping event");
            return;
        }

        if run.awaiting_thread {
            run.awaiting_thread = false;
            if event.thread_id != run.thread_id {
                // The backend assigned another id; adopt it
                let proposed = std::mem::replace(&mut run.thread_id, event.thread_id.clone());
                tracing::info!(
                    proposed = %proposed,
                    confirmed = %event.thread_id,
                    "thread id reassigned"
                );
                if self.current_thread_id.as_deref() == Some(proposed.as_str()) {
                    self.current_thread_id = Some(event.thread_id.clone());
                }
            }
            if let Err(fault) = self.cache.confirm_placeholder(&event.thread_id) {
                tracing::debug!(%fault, "placeholder re-keyed");
            }
            self.unconfirmed_thread = None;
            self.mark_dirty();
        }

        let Some(run) = self.run.as_mut() else {
            return;
        };
        if event.thread_id != run.thread_id {
            let fault = IntegrityError::ThreadMismatch {
                expected: run.thread_id.clone(),
                actual: event.thread_id.clone(),
            };
            tracing::warn!(%fault, "dropping event");
            return;
        }

        if let Some(message_id) = event.kind.message_id() {
            match &run.message_id {
                Some(expected) if expected != message_id => {
                    let fault = IntegrityError::MessageMismatch {
                        expected: expected.clone(),
                        actual: message_id.to_string(),
                    };
                    // A terminal error still ends the run with its own code
                    if !matches!(event.kind, RunEventKind::Error { .. }) {
                        tracing::warn!(%fault, "dropping event");
                        return;
                    }
                    tracing::warn!(%fault, "applying terminal error despite mismatch");
                }
                Some(_) => {}
                None => run.message_id = Some(message_id.to_string()),
            }
        }

        if let RunEventKind::ThreadTitleUpdated { title } = &event.kind {
            let thread_id = run.thread_id.clone();
            if self.cache.patch_title(&thread_id, title) {
                self.mark_dirty();
            }
            return;
        }

        let reply_index = run.reply_index;
        let Some(reply) = self.messages.get_mut(reply_index) else {
            return;
        };
        match run.accumulator.apply(&mut reply.parts, &event.kind) {
            Applied::Mutated => self.mark_dirty(),
            Applied::Unchanged | Applied::Dropped(_) => {}
            Applied::Failed(err) => self.fail_run(RuntimeError::Provider(err)),
            Applied::Completed(message) => self.complete_run(*message),
        }
    }

    fn handle_run_ended(&mut self, run_id: &str) {
        if self.active_run_id() != Some(run_id) {
            return;
        }
        if self.phase == Phase::Streaming {
            // The pump always reports a failure before ending; be safe anyway
            self.fail_run(TransportError::EndedWithoutCompletion.into());
        }
        tracing::debug!(run_id = %run_id, "run ended");
        self.run = None;
        self.run_task = None;
        self.phase = Phase::Idle;
    }

    fn handle_history_loaded(
        &mut self,
        generation: u64,
        thread_id: &str,
        result: Result<Vec<StoredMessage>, StoreError>,
    ) {
        // Guard: a later switch superseded this fetch
        if self.history != (HistoryState::Loading { generation }) {
            tracing::debug!(thread_id = %thread_id, generation, "discarding stale history");
            return;
        }
        self.history_task = None;

        match result {
            Ok(stored) => {
                self.messages = hydrate_messages(stored);
                self.history = HistoryState::Loaded;
                tracing::debug!(
                    thread_id = %thread_id,
                    messages = self.messages.len(),
                    "history loaded"
                );
            }
            Err(err) => {
                tracing::warn!(thread_id = %thread_id, error = %err, "history load failed");
                self.history = HistoryState::Failed;
                self.last_error = Some(RuntimeError::Store(err));
            }
        }
        self.flush();
    }

    fn handle_thread_list_loaded(
        &mut self,
        generation: u64,
        append: bool,
        result: Result<ThreadPage, StoreError>,
    ) {
        if generation == self.cache.generation {
            self.list_task = None;
        }
        match result {
            Ok(page) => {
                if self.cache.apply_page(generation, page, append) {
                    self.mark_dirty();
                }
            }
            Err(err) => {
                if generation == self.cache.generation {
                    tracing::warn!(error = %err, "thread list load failed");
                    self.cache.fail_load(generation);
                    self.last_error = Some(RuntimeError::Store(err));
                    self.mark_dirty();
                }
            }
        }
    }
}
