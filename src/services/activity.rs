//! Visitor activity shared between the host and the tour
//!
//! The host records interaction with the visualization here; the tour reads
//! how long it has been idle (for auto-activation) and flips the
//! interaction-disabled flag while a blocking tour runs.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct ActivityState {
    /// Idle time is measured from here until the first interaction
    created_at: Instant,
    last_active_at: Option<Instant>,
    interaction_disabled: bool,
}

/// Cloneable handle onto the shared activity state
#[derive(Debug, Clone)]
pub struct ActivityMonitor {
    inner: Arc<Mutex<ActivityState>>,
}

impl ActivityMonitor {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ActivityState {
                created_at: Instant::now(),
                last_active_at: None,
                interaction_disabled: false,
            })),
        }
    }

    /// Record visitor interaction now
    pub fn note_activity(&self) {
        self.inner.lock().last_active_at = Some(Instant::now());
    }

    /// Time since the last interaction (or since creation if there was none)
    pub fn inactive_for(&self) -> Duration {
        let state = self.inner.lock();
        let since = state.last_active_at.unwrap_or(state.created_at);
        Instant::now().saturating_duration_since(since)
    }

    pub fn last_active_at(&self) -> Option<Instant> {
        self.inner.lock().last_active_at
    }

    pub fn set_interaction_disabled(&self, disabled: bool) {
        self.inner.lock().interaction_disabled = disabled;
    }

    pub fn interaction_disabled(&self) -> bool {
        self.inner.lock().interaction_disabled
    }
}

impl Default for ActivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_idle_measured_from_creation() {
        let activity = ActivityMonitor::new();
        tokio::time::advance(Duration::from_millis(1200)).await;
        assert_eq!(activity.inactive_for(), Duration::from_millis(1200));
        assert!(activity.last_active_at().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_resets_idle_time() {
        let activity = ActivityMonitor::new();
        tokio::time::advance(Duration::from_millis(800)).await;
        activity.note_activity();
        tokio::time::advance(Duration::from_millis(300)).await;
        assert_eq!(activity.inactive_for(), Duration::from_millis(300));
    }

    #[test]
    fn test_interaction_flag_shared_between_clones() {
        let activity = ActivityMonitor::new();
        let host_view = activity.clone();
        activity.set_interaction_disabled(true);
        assert!(host_view.interaction_disabled());
    }
}
