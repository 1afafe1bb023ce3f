//! Run submission and event stream pumping for the SessionRuntime.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::accumulator::PartAccumulator;
use crate::attachments::{embed_attachments, Attachment};
use crate::error::{RuntimeError, RuntimeResult, TransportError, ValidationError};
use crate::models::{Message, MessageStatus, Notice, StreamRequest};
use crate::traits::EventSource;

use super::{ActiveRun, HistoryState, Phase, RunHandle, RuntimeMessage, SessionRuntime};

impl SessionRuntime {
    /// Submit user content, optionally with attachments, and start a run.
    ///
    /// With no current thread (or one the backend has not confirmed yet) the
    /// runtime proposes a new thread id and lists a placeholder entry for it;
    /// otherwise the run continues the current thread.
    pub fn submit(
        &mut self,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> RuntimeResult<RunHandle> {
        if content.trim().is_empty() && attachments.is_empty() {
            return Err(ValidationError::EmptySubmission.into());
        }
        if self.phase == Phase::Streaming {
            return Err(ValidationError::RunInProgress.into());
        }
        if let (HistoryState::Loading { .. }, Some(thread_id)) =
            (self.history, &self.current_thread_id)
        {
            return Err(ValidationError::ThreadLoading {
                thread_id: thread_id.clone(),
            }
            .into());
        }

        let title_source = if content.trim().is_empty() {
            attachments
                .first()
                .map(|a| a.name.clone())
                .unwrap_or_default()
        } else {
            content.trim().to_string()
        };
        let content = embed_attachments(content, &attachments);

        self.last_error = None;
        self.last_submission = Some(content.clone());
        Ok(self.start_run(content, &title_source))
    }

    /// Resubmit the last content after a failed run.
    ///
    /// Only failures classified retryable qualify; nothing retries on its own.
    pub fn retry_last(&mut self) -> RuntimeResult<RunHandle> {
        if self.phase == Phase::Streaming {
            return Err(ValidationError::RunInProgress.into());
        }
        let failed_reply = self
            .messages
            .last()
            .is_some_and(|m| m.status == MessageStatus::Failed);
        let (Some(error), true) = (self.last_error.clone(), failed_reply) else {
            return Err(ValidationError::NotRetryable {
                reason: "no failed run to retry".to_string(),
            }
            .into());
        };
        if !error.is_retryable() {
            tracing::info!(code = %error.error_code(), "refusing to retry");
            return Err(ValidationError::NotRetryable {
                reason: error.user_message(),
            }
            .into());
        }
        let Some(content) = self.last_submission.clone() else {
            return Err(ValidationError::NotRetryable {
                reason: "no previous submission".to_string(),
            }
            .into());
        };

        // Drop the failed exchange; the run appends a fresh one
        self.messages.truncate(self.messages.len().saturating_sub(2));

        tracing::info!(code = %error.error_code(), "retrying last submission");
        self.last_error = None;
        let title_source = content.clone();
        Ok(self.start_run(content, &title_source))
    }

    fn start_run(&mut self, content: String, title_source: &str) -> RunHandle {
        self.quiesce_run();
        if let Some(timer) = self.reconcile_task.take() {
            timer.abort();
        }

        let run_id = Uuid::new_v4().to_string();
        let continuing = self
            .current_thread_id
            .clone()
            .filter(|id| self.unconfirmed_thread.as_deref() != Some(id.as_str()));

        let (request, thread_id, awaiting_thread) = match continuing {
            Some(thread_id) => {
                self.cache.touch(&thread_id);
                let request =
                    StreamRequest::with_thread(run_id.clone(), content.clone(), thread_id.clone());
                (request, thread_id, false)
            }
            None => {
                let thread_id = self
                    .unconfirmed_thread
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                self.cache.insert_placeholder(
                    &thread_id,
                    title_source,
                    self.config.placeholder_title_chars,
                );
                self.current_thread_id = Some(thread_id.clone());
                self.unconfirmed_thread = Some(thread_id.clone());
                let request =
                    StreamRequest::new_thread(run_id.clone(), content.clone(), thread_id.clone());
                (request, thread_id, true)
            }
        };
        let request = request.with_model(self.config.model.clone());

        self.messages.push(Message::user(content));
        self.messages.push(Message::assistant_placeholder());
        let cancel = CancellationToken::new();
        self.run = Some(ActiveRun {
            run_id: run_id.clone(),
            thread_id: thread_id.clone(),
            awaiting_thread,
            message_id: None,
            cancel: cancel.clone(),
            accumulator: PartAccumulator::new(),
            reply_index: self.messages.len() - 1,
        });
        self.phase = Phase::Streaming;

        let source = Arc::clone(&self.source);
        let message_tx = self.message_tx.clone();
        self.run_task = Some(tokio::spawn(pump_run(source, request, cancel, message_tx)));

        tracing::info!(
            run_id = %run_id,
            thread_id = %thread_id,
            new_thread = awaiting_thread,
            "run started"
        );
        self.flush();

        RunHandle { run_id, thread_id }
    }

    /// Drop a settled run whose pump has not reported back yet.
    pub(crate) fn quiesce_run(&mut self) {
        if let Some(run) = self.run.take() {
            run.cancel.cancel();
            tracing::debug!(run_id = %run.run_id, "quiescing lingering run");
        }
        if let Some(task) = self.run_task.take() {
            task.abort();
        }
        self.phase = Phase::Idle;
    }

    /// Finish the active run with a failure note on the reply.
    pub(crate) fn fail_run(&mut self, error: RuntimeError) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        if let RuntimeError::Transport(_) = &error {
            tracing::error!(
                run_id = %run.run_id,
                thread_id = %run.thread_id,
                error = %error,
                "run stream failed"
            );
        } else {
            tracing::warn!(
                run_id = %run.run_id,
                code = %error.error_code(),
                error = %error,
                "run failed"
            );
        }
        if let Some(reply) = self.messages.get_mut(run.reply_index) {
            reply.fail(Notice::error(error.error_code(), error.user_message()));
        }
        self.last_error = Some(error);
        self.settle();
    }

    /// Finish the active run with the server-confirmed message.
    pub(crate) fn complete_run(&mut self, mut message: Message) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        tracing::info!(
            run_id = %run.run_id,
            message_id = %message.id,
            parts = message.parts.len(),
            "run completed"
        );
        let thread_id = run.thread_id.clone();
        if let Some(reply) = self.messages.get_mut(run.reply_index) {
            message.status = MessageStatus::Complete;
            message.notice = None;
            message.created_at = reply.created_at;
            *reply = message;
        }
        self.cache.touch(&thread_id);
        self.settle();
    }

    /// Streaming → Settled with both terminal snapshots published.
    fn settle(&mut self) {
        // Nothing after the terminal event is applied; stop the transport
        if let Some(run) = &self.run {
            run.cancel.cancel();
        }
        // Final content while still running, then the cleared flag
        self.flush();
        self.phase = Phase::Settled;
        self.flush();
        self.schedule_reconcile();
    }
}

/// Open the event source and forward events until a terminal event, an
/// error, the end of the stream or cancellation.
async fn pump_run(
    source: Arc<dyn EventSource>,
    request: StreamRequest,
    cancel: CancellationToken,
    message_tx: mpsc::UnboundedSender<RuntimeMessage>,
) {
    let run_id = request.run_id.clone();

    let opened = tokio::select! {
        _ = cancel.cancelled() => None,
        opened = source.open(&request, cancel.clone()) => Some(opened),
    };

    match opened {
        None => {}
        Some(Err(error)) => {
            if !cancel.is_cancelled() {
                let _ = message_tx.send(RuntimeMessage::RunFailed {
                    run_id: run_id.clone(),
                    error,
                });
            }
        }
        Some(Ok(mut stream)) => {
            let mut completed = false;
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    next = stream.next() => next,
                };
                match next {
                    Some(Ok(event)) => {
                        let terminal = event.is_terminal() && event.run_id == run_id;
                        let _ = message_tx.send(RuntimeMessage::RunEvent {
                            run_id: run_id.clone(),
                            event,
                        });
                        if terminal {
                            completed = true;
                            break;
                        }
                    }
                    Some(Err(error)) => {
                        if !cancel.is_cancelled() {
                            let _ = message_tx.send(RuntimeMessage::RunFailed {
                                run_id: run_id.clone(),
                                error,
                            });
                        }
                        completed = true;
                        break;
                    }
                    None => break,
                }
            }
            if !completed && !cancel.is_cancelled() {
                let _ = message_tx.send(RuntimeMessage::RunFailed {
                    run_id: run_id.clone(),
                    error: TransportError::EndedWithoutCompletion,
                });
            }
        }
    }

    let _ = message_tx.send(RuntimeMessage::RunEnded { run_id });
}
