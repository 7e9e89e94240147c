//! Starting the tour after the visitor has been idle long enough

use super::{Tour, TourEvent};
use crate::infra::diagnostics::Diagnostic;
use crate::services::scheduler::{TimerHandle, TimerId};
use std::time::Duration;
use tracing::{debug, info};

impl Tour {
    /// (Re)arm the inactivity timer, if the tour auto-activates at all
    ///
    /// When the extra condition currently holds, the timer fires once the
    /// threshold has passed since the last interaction; otherwise it checks
    /// again after a full threshold.
    pub(crate) fn set_auto_start(&mut self) -> Option<Duration> {
        self.auto_timer = None;
        let threshold = self.setting.auto_activate_after()?;

        let wait = if self.auto_activate_allowed() {
            threshold.saturating_sub(self.activity.inactive_for())
        } else {
            threshold
        };
        self.auto_timer = Some(
            self.scheduler
                .schedule(wait, |timer| TourEvent::AutoActivate { timer }),
        );
        debug!(tour_id = %self.id, wait_ms = %wait.as_millis(), "tour_auto_activate_armed");
        Some(wait)
    }

    pub(crate) fn on_auto_activate(&mut self, timer: TimerId) {
        if self.auto_timer.as_ref().map(TimerHandle::id) != Some(timer) {
            self.stale("auto_activate", None);
            return;
        }
        self.auto_timer = None;
        if self.started {
            return;
        }
        let Some(threshold) = self.setting.auto_activate_after() else {
            return;
        };

        let idle = self.activity.inactive_for();
        if idle >= threshold && self.auto_activate_allowed() {
            info!(tour_id = %self.id, idle_ms = %idle.as_millis(), "tour_auto_activated");
            self.metrics.record_auto_activation();
            self.start();
        } else if let Some(wait) = self.set_auto_start() {
            self.diagnostics
                .record(Diagnostic::AutoActivateRescheduled { wait });
        }
    }

    fn auto_activate_allowed(&self) -> bool {
        self.auto_activate_condition
            .as_ref()
            .map_or(true, |condition| condition())
    }
}
