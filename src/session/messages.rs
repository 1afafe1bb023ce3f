//! Messages sent from background tasks back to the runtime.

use crate::error::{StoreError, TransportError};
use crate::events::RunEvent;
use crate::models::{StoredMessage, ThreadPage};

/// Thread metadata write sent to the store
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadMutation {
    Rename { thread_id: String, title: String },
    SetPinned { thread_id: String, pinned: bool },
    Delete { thread_id: String },
}

impl ThreadMutation {
    pub fn thread_id(&self) -> &str {
        match self {
            ThreadMutation::Rename { thread_id, .. }
            | ThreadMutation::SetPinned { thread_id, .. }
            | ThreadMutation::Delete { thread_id } => thread_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThreadMutation::Rename { .. } => "rename",
            ThreadMutation::SetPinned { .. } => "set_pinned",
            ThreadMutation::Delete { .. } => "delete",
        }
    }
}

/// Messages that can be sent to the runtime from async tasks
#[derive(Debug)]
pub enum RuntimeMessage {
    /// An event delivered by the run's event source
    RunEvent { run_id: String, event: RunEvent },
    /// The event source failed before a terminal event
    RunFailed { run_id: String, error: TransportError },
    /// The run's pump task finished
    RunEnded { run_id: String },
    /// Stored history for a thread switch
    HistoryLoaded {
        generation: u64,
        thread_id: String,
        result: Result<Vec<StoredMessage>, StoreError>,
    },
    /// A thread list page (fresh load, next page or reconciliation)
    ThreadListLoaded {
        generation: u64,
        append: bool,
        result: Result<ThreadPage, StoreError>,
    },
    /// The reconciliation delay elapsed
    ReconcileDue,
    /// A thread metadata write resolved
    MutationFinished {
        mutation: ThreadMutation,
        result: Result<(), StoreError>,
    },
}
