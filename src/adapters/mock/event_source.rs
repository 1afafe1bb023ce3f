//! Scripted event source for testing.
//!
//! Each `open` call consumes the next queued [`RunScript`]. Events in a script
//! are stamped with the request's run id and thread id, so a test only writes
//! the event kinds.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::events::{RunEvent, RunEventKind};
use crate::models::StreamRequest;
use crate::traits::{EventSource, EventStream};

#[derive(Debug, Clone)]
enum ScriptStep {
    Event(RunEventKind),
    Raw(RunEvent),
    Delay(Duration),
    Error(TransportError),
    /// Block until cancelled
    Hang,
}

/// What one run of the mock does, step by step.
#[derive(Debug, Clone, Default)]
pub struct RunScript {
    open_error: Option<TransportError>,
    steps: Vec<ScriptStep>,
}

impl RunScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// `open` itself fails
    pub fn fail_open(err: TransportError) -> Self {
        Self {
            open_error: Some(err),
            steps: Vec::new(),
        }
    }

    /// Yield an event stamped with the request's ids
    pub fn event(mut self, kind: RunEventKind) -> Self {
        self.steps.push(ScriptStep::Event(kind));
        self
    }

    pub fn events(mut self, kinds: impl IntoIterator<Item = RunEventKind>) -> Self {
        self.steps.extend(kinds.into_iter().map(ScriptStep::Event));
        self
    }

    /// Yield an event exactly as given
    pub fn raw(mut self, event: RunEvent) -> Self {
        self.steps.push(ScriptStep::Raw(event));
        self
    }

    pub fn delay(mut self, duration: Duration) -> Self {
        self.steps.push(ScriptStep::Delay(duration));
        self
    }

    /// Yield a transport error (the stream ends after it)
    pub fn error(mut self, err: TransportError) -> Self {
        self.steps.push(ScriptStep::Error(err));
        self
    }

    /// Stay open until the run is cancelled
    pub fn hang(mut self) -> Self {
        self.steps.push(ScriptStep::Hang);
        self
    }
}

/// Mock event source replaying queued scripts.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEventSource {
    scripts: Arc<Mutex<VecDeque<RunScript>>>,
    requests: Arc<Mutex<Vec<StreamRequest>>>,
}

impl ScriptedEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the script for the next `open`
    pub fn push(&self, script: RunScript) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(script);
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn open_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct Playback {
    steps: VecDeque<ScriptStep>,
    cancel: CancellationToken,
    thread_id: String,
    run_id: String,
}

#[async_trait]
impl EventSource for ScriptedEventSource {
    async fn open(
        &self,
        request: &StreamRequest,
        cancel: CancellationToken,
    ) -> Result<EventStream, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let script = self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| TransportError::ConnectionFailed {
                url: "mock://scripted".to_string(),
                message: "no script queued".to_string(),
            })?;
        if let Some(err) = script.open_error {
            return Err(err);
        }

        let playback = Playback {
            steps: script.steps.into(),
            cancel,
            thread_id: request
                .thread_id
                .clone()
                .or_else(|| request.new_thread_id.clone())
                .unwrap_or_default(),
            run_id: request.run_id.clone(),
        };

        let events = stream::unfold(playback, |mut playback| async move {
            loop {
                if playback.cancel.is_cancelled() {
                    return None;
                }
                let step = playback.steps.pop_front()?;
                let item = match step {
                    ScriptStep::Event(kind) => Ok(RunEvent::new(
                        playback.thread_id.clone(),
                        playback.run_id.clone(),
                        kind,
                    )),
                    ScriptStep::Raw(event) => Ok(event),
                    ScriptStep::Error(err) => {
                        playback.steps.clear();
                        Err(err)
                    }
                    ScriptStep::Delay(duration) => {
                        tokio::select! {
                            _ = playback.cancel.cancelled() => return None,
                            _ = tokio::time::sleep(duration) => continue,
                        }
                    }
                    ScriptStep::Hang => {
                        playback.cancel.cancelled().await;
                        return None;
                    }
                };
                return Some((item, playback));
            }
        });

        Ok(Box::pin(events))
    }
}
