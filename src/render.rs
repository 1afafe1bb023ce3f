//! Snapshot publishing on a fixed cadence.
//!
//! Mutations only mark the scheduler dirty. A tick publishes at most one
//! snapshot no matter how many mutations happened since the previous one,
//! and `flush` publishes immediately for terminal states.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, Interval, MissedTickBehavior};

pub struct RenderScheduler<T> {
    tx: watch::Sender<T>,
    dirty: bool,
    publish_count: u64,
    ticker: Interval,
}

impl<T: Clone> RenderScheduler<T> {
    /// Create a scheduler publishing `initial` until the first tick.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(initial: T, period: Duration) -> Self {
        let (tx, _rx) = watch::channel(initial);
        let mut ticker = interval(period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            tx,
            dirty: false,
            publish_count: 0,
            ticker,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of snapshots published so far
    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }

    /// Latest published snapshot
    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Publish if anything changed since the last publish. Returns whether a
    /// snapshot went out.
    pub fn tick(&mut self, build: impl FnOnce() -> T) -> bool {
        if !self.dirty {
            return false;
        }
        self.publish(build());
        true
    }

    /// Publish now, dirty or not
    pub fn flush(&mut self, build: impl FnOnce() -> T) {
        self.publish(build());
    }

    /// Wait for the next cadence tick
    pub async fn wait_tick(&mut self) {
        self.ticker.tick().await;
    }

    fn publish(&mut self, snapshot: T) {
        // send_replace never fails, even with no receivers
        self.tx.send_replace(snapshot);
        self.dirty = false;
        self.publish_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tick_without_mutation_publishes_nothing() {
        let mut scheduler = RenderScheduler::new(0u32, Duration::from_millis(16));
        assert!(!scheduler.tick(|| 1));
        assert_eq!(scheduler.publish_count(), 0);
        assert_eq!(scheduler.current(), 0);
    }

    #[tokio::test]
    async fn test_many_mutations_collapse_into_one_publish() {
        let mut scheduler = RenderScheduler::new(0u32, Duration::from_millis(16));
        let rx = scheduler.subscribe();

        let mut value = 0;
        for _ in 0..100 {
            value += 1;
            scheduler.mark_dirty();
        }
        assert!(scheduler.tick(|| value));
        assert!(!scheduler.tick(|| value));

        assert_eq!(scheduler.publish_count(), 1);
        assert_eq!(*rx.borrow(), 100);
    }

    #[tokio::test]
    async fn test_flush_publishes_even_when_clean() {
        let mut scheduler = RenderScheduler::new("idle", Duration::from_millis(16));
        let mut rx = scheduler.subscribe();

        scheduler.flush(|| "done");

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "done");
        assert!(!scheduler.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_tick_follows_period() {
        let mut scheduler = RenderScheduler::new(0u32, Duration::from_millis(16));
        // First tick of an interval completes immediately
        scheduler.wait_tick().await;

        let start = tokio::time::Instant::now();
        scheduler.wait_tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(16));
    }
}
