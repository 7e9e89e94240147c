//! Timers that feed the tour event loop
//!
//! Timers never touch tour state themselves: when one elapses it posts a
//! [`TourEvent`] back onto the tour's channel, and the loop decides whether
//! the event still matters by comparing the timer id with the live handle.

use crate::services::tour::TourEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pending timer. Dropping the handle cancels it.
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    handle: JoinHandle<()>,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Hands out ids and spawns timers posting back to the tour loop
#[derive(Debug)]
pub struct Scheduler {
    events_tx: mpsc::UnboundedSender<TourEvent>,
    next_id: u64,
}

impl Scheduler {
    pub fn new(events_tx: mpsc::UnboundedSender<TourEvent>) -> Self {
        Self { events_tx, next_id: 0 }
    }

    /// Next id, shared by timers and transition tasks
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Post the event built by `event` after `after` has elapsed
    pub fn schedule(
        &mut self,
        after: Duration,
        event: impl FnOnce(TimerId) -> TourEvent,
    ) -> TimerHandle {
        let id = TimerId(self.next_id());
        let event = event(id);
        let events_tx = self.events_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events_tx.send(event);
        });
        TimerHandle { id, handle }
    }

    /// Post an event to be handled after the current one (one loop tick later)
    pub fn defer(&self, event: TourEvent) {
        let _ = self.events_tx.send(event);
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<TourEvent> {
        self.events_tx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tour::TourEvent;

    #[tokio::test(start_paused = true)]
    async fn test_timer_posts_event_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(tx);

        let timer = scheduler.schedule(Duration::from_millis(500), |timer| {
            TourEvent::AutoActivate { timer }
        });

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(rx.try_recv().is_err());

        match rx.recv().await {
            Some(TourEvent::AutoActivate { timer: fired }) => assert_eq!(fired, timer.id()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(tx);

        let timer = scheduler.schedule(Duration::from_millis(100), |timer| {
            TourEvent::AutoActivate { timer }
        });
        drop(timer);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_ids_are_monotonic() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(tx);
        let first = scheduler.next_id();
        let second = scheduler.next_id();
        assert!(second > first);
    }
}
