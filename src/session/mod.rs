//! Session runtime
//!
//! Owns the working transcript, the current-thread pointer, the active run
//! and the thread list cache. Operations are synchronous `&mut self` methods
//! that spawn tokio tasks; the tasks report back through [`RuntimeMessage`]s
//! which [`SessionRuntime::handle_message`] applies. Snapshots are published
//! on a fixed cadence through a [`RenderScheduler`].

mod cancel;
mod handlers;
mod messages;
mod navigation;
mod stream;
mod thread_ops;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::accumulator::PartAccumulator;
use crate::cache::ThreadListCache;
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::models::{Message, Thread};
use crate::render::RenderScheduler;
use crate::traits::{EventSource, ThreadStore};

pub use messages::{RuntimeMessage, ThreadMutation};

/// Run lifecycle of the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No run
    #[default]
    Idle,
    /// A run is consuming events
    Streaming,
    /// The run reached a terminal state; its task may still be winding down
    Settled,
}

/// Loading state of the current thread's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryState {
    /// No thread selected, or a fresh conversation
    #[default]
    Empty,
    Loading { generation: u64 },
    Loaded,
    Failed,
}

/// Identifies a started run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub run_id: String,
    pub thread_id: String,
}

/// Thread list as seen by the UI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadListView {
    pub items: Vec<Thread>,
    pub is_loading: bool,
    pub has_more: bool,
}

/// Everything a view needs to render the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub is_running: bool,
    pub messages: Vec<Message>,
    pub current_thread_id: Option<String>,
    pub is_loading_history: bool,
    pub thread_list: ThreadListView,
    pub last_error: Option<RuntimeError>,
}

/// The run currently owned by the runtime
#[derive(Debug)]
pub(crate) struct ActiveRun {
    pub(crate) run_id: String,
    /// Thread the run's events must carry
    pub(crate) thread_id: String,
    /// True until the first event confirms a newly proposed thread
    pub(crate) awaiting_thread: bool,
    /// Reply message id assigned by the backend
    pub(crate) message_id: Option<String>,
    pub(crate) cancel: CancellationToken,
    pub(crate) accumulator: PartAccumulator,
    /// Index of the assistant reply in the transcript
    pub(crate) reply_index: usize,
}

enum Wake {
    Message(RuntimeMessage),
    Tick,
}

pub struct SessionRuntime {
    pub(crate) config: RuntimeConfig,
    pub(crate) source: Arc<dyn EventSource>,
    pub(crate) store: Arc<dyn ThreadStore>,

    /// Working transcript of the current thread
    pub(crate) messages: Vec<Message>,
    pub(crate) current_thread_id: Option<String>,
    /// Proposed id of a new thread the backend has not confirmed yet
    pub(crate) unconfirmed_thread: Option<String>,
    pub(crate) history: HistoryState,
    /// Bumped on every switch so late history fetches can be discarded
    pub(crate) switch_generation: u64,

    pub(crate) phase: Phase,
    pub(crate) run: Option<ActiveRun>,
    pub(crate) last_error: Option<RuntimeError>,
    /// Content of the last submission, for `retry_last`
    pub(crate) last_submission: Option<String>,

    pub(crate) cache: ThreadListCache,
    pub(crate) scheduler: RenderScheduler<Snapshot>,

    pub message_tx: mpsc::UnboundedSender<RuntimeMessage>,
    message_rx: mpsc::UnboundedReceiver<RuntimeMessage>,

    pub(crate) run_task: Option<JoinHandle<()>>,
    pub(crate) history_task: Option<JoinHandle<()>>,
    pub(crate) list_task: Option<JoinHandle<()>>,
    pub(crate) reconcile_task: Option<JoinHandle<()>>,
    pub(crate) mutation_tasks: Vec<JoinHandle<()>>,
    pub(crate) pending_mutations: usize,
}

impl SessionRuntime {
    /// Create a runtime. Must be called from within a tokio runtime.
    pub fn new(
        config: RuntimeConfig,
        source: Arc<dyn EventSource>,
        store: Arc<dyn ThreadStore>,
    ) -> Self {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let scheduler = RenderScheduler::new(Snapshot::default(), config.publish_interval);

        Self {
            config,
            source,
            store,
            messages: Vec::new(),
            current_thread_id: None,
            unconfirmed_thread: None,
            history: HistoryState::Empty,
            switch_generation: 0,
            phase: Phase::Idle,
            run: None,
            last_error: None,
            last_submission: None,
            cache: ThreadListCache::new(),
            scheduler,
            message_tx,
            message_rx,
            run_task: None,
            history_task: None,
            list_task: None,
            reconcile_task: None,
            mutation_tasks: Vec::new(),
            pending_mutations: 0,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Streaming
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn current_thread_id(&self) -> Option<&str> {
        self.current_thread_id.as_deref()
    }

    pub fn history_state(&self) -> HistoryState {
        self.history
    }

    pub fn thread_cache(&self) -> &ThreadListCache {
        &self.cache
    }

    pub fn last_error(&self) -> Option<&RuntimeError> {
        self.last_error.as_ref()
    }

    /// Run id of the active run, if any
    pub fn active_run_id(&self) -> Option<&str> {
        self.run.as_ref().map(|run| run.run_id.as_str())
    }

    /// Message id the backend assigned to the streaming reply, once known
    pub fn active_message_id(&self) -> Option<&str> {
        self.run.as_ref().and_then(|run| run.message_id.as_deref())
    }

    /// Receiver of published snapshots
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.scheduler.subscribe()
    }

    /// Number of snapshots published so far
    pub fn publish_count(&self) -> u64 {
        self.scheduler.publish_count()
    }

    /// Build a snapshot of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            is_running: self.is_running(),
            messages: self.messages.clone(),
            current_thread_id: self.current_thread_id.clone(),
            is_loading_history: matches!(self.history, HistoryState::Loading { .. }),
            thread_list: ThreadListView {
                items: self.cache.items(),
                is_loading: self.cache.is_loading(),
                has_more: self.cache.has_more(),
            },
            last_error: self.last_error.clone(),
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.scheduler.mark_dirty();
    }

    /// Publish now, regardless of cadence
    pub(crate) fn flush(&mut self) {
        let snapshot = self.snapshot();
        self.scheduler.flush(move || snapshot);
    }

    fn publish_tick(&mut self) {
        if self.scheduler.is_dirty() {
            let snapshot = self.snapshot();
            self.scheduler.tick(move || snapshot);
        }
    }

    /// True when nothing is in flight: no run, fetch, timer or mutation
    pub fn is_idle(&self) -> bool {
        self.run.is_none()
            && !matches!(self.history, HistoryState::Loading { .. })
            && !self.cache.is_loading()
            && self.reconcile_task.is_none()
            && self.pending_mutations == 0
    }

    /// Wait for one message or one render tick and apply it.
    pub async fn step(&mut self) {
        let wake = tokio::select! {
            Some(msg) = self.message_rx.recv() => Wake::Message(msg),
            _ = self.scheduler.wait_tick() => Wake::Tick,
        };
        match wake {
            Wake::Message(msg) => self.handle_message(msg),
            Wake::Tick => self.publish_tick(),
        }
    }

    /// Drive the runtime until [`is_idle`](Self::is_idle), then publish any
    /// pending change.
    pub async fn run_until_idle(&mut self) {
        while !self.is_idle() {
            self.step().await;
        }
        // Apply anything already queued (e.g. a late event to discard)
        while let Ok(msg) = self.message_rx.try_recv() {
            self.handle_message(msg);
        }
        self.publish_tick();
    }

    /// Cancel the active run and abort every background task.
    pub fn shutdown(&mut self) {
        self.cancel();
        for task in [
            self.run_task.take(),
            self.history_task.take(),
            self.list_task.take(),
            self.reconcile_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
        for task in self.mutation_tasks.drain(..) {
            task.abort();
        }
        self.pending_mutations = 0;
        self.run = None;
        self.phase = Phase::Idle;
        if let HistoryState::Loading { .. } = self.history {
            self.history = HistoryState::Failed;
        }
        self.cache.fail_load(self.cache.generation);
        tracing::info!("session runtime shut down");
        self.flush();
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        if let Some(run) = &self.run {
            run.cancel.cancel();
        }
        for task in [
            &self.run_task,
            &self.history_task,
            &self.list_task,
            &self.reconcile_task,
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
        for task in &self.mutation_tasks {
            task.abort();
        }
    }
}
