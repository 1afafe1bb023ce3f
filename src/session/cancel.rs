//! Run cancellation for the SessionRuntime.
//!
//! Cancelling stops the transport through the run's token and settles the
//! reply in place right away; the pump reports back later and anything it
//! delivered after the cancel is discarded.

use super::{Phase, SessionRuntime};

impl SessionRuntime {
    /// Stop the streaming run, if any.
    ///
    /// The reply keeps what was streamed and is marked cancelled (an empty
    /// reply gets a quiet cancellation note, not an error). Returns `false`
    /// when there was nothing to cancel, so a second call is a no-op.
    pub fn cancel(&mut self) -> bool {
        // Guard: only a streaming run can be cancelled
        if self.phase != Phase::Streaming {
            return false;
        }
        let Some(run) = self.run.as_ref() else {
            return false;
        };

        run.cancel.cancel();
        tracing::info!(run_id = %run.run_id, thread_id = %run.thread_id, "run cancelled");

        if let Some(reply) = self.messages.get_mut(run.reply_index) {
            reply.cancel();
        }
        self.phase = Phase::Settled;
        self.flush();
        self.schedule_reconcile();
        true
    }
}
