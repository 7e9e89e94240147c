//! Lifecycle of a single stop
//!
//! INACTIVE -> TRANSITION_IN -> ACTIVE_WAIT -> TRANSITION_OUT -> INACTIVE.
//! Arrival happens when the last block on a TRANSITION_IN stop is removed
//! (normally the flight block, once the camera lands) or when the stop is
//! advanced early.

use super::{Propagation, Tour, TourEvent};
use crate::domain::blocks::{BLOCK_FLIGHT, BLOCK_MANUAL, BLOCK_TIMER, BLOCK_TOURPAUSED};
use crate::domain::errors::TourError;
use crate::domain::types::{Direction, StopState, TourState};
use crate::infra::diagnostics::Diagnostic;
use crate::services::scheduler::TimerId;
use crate::services::transition::{MotionPlan, TaskId, TransitionOutcome, TransitionTask};
use tracing::{debug, info, warn};

impl Tour {
    /// Begin moving into a stop
    pub(crate) fn play(&mut self, step: usize, direction: Direction) {
        self.diagnostics
            .record(Diagnostic::PlayingStop { step, direction });
        self.stops[step].direction = direction;

        if self.stops[step].is_moving() {
            self.diagnostics.record(Diagnostic::ReentrantPlay { step });
            return;
        }

        let mut delay = None;
        if self.stops[step].state != StopState::TransitionIn {
            self.transition(step, StopState::TransitionIn);
            if direction != Direction::Backward {
                delay = self.stops[step].setting.transition_delay();
            }
            if let Some(on_start) = self.stops[step].hooks.on_start.clone() {
                on_start(step);
            }
        }

        self.block_add(step, BLOCK_FLIGHT, Propagation::Mirror);

        let target = self.target_of(step);
        let plan = MotionPlan::for_stop(&self.stops[step].setting, target, direction);
        info!(
            tour_id = %self.id,
            step,
            direction = direction.as_str(),
            motion = plan.kind(),
            delay_ms = ?delay.map(|d| d.as_millis()),
            "tourstop_playing"
        );

        let task_id = TaskId(self.scheduler.next_id());
        let task = TransitionTask::spawn(
            task_id,
            step,
            delay,
            plan,
            self.animation.clone(),
            self.scheduler.sender(),
        );
        self.stops[step].transition = Some(task);
        self.metrics.record_stop_played();
    }

    pub(crate) fn on_transition_settled(
        &mut self,
        step: usize,
        task: TaskId,
        outcome: TransitionOutcome,
    ) -> Result<(), TourError> {
        let current = self
            .stops
            .get(step)
            .and_then(|stop| stop.transition.as_ref())
            .map(TransitionTask::id);
        if current != Some(task) {
            self.stale("transition_settled", Some(step));
            return Ok(());
        }
        self.stops[step].transition = None;
        self.settle_transition(step, outcome)
    }

    /// Act on how motion into a stop ended
    ///
    /// Interruptions are expected (pause, exit, skipping ahead) and swallowed.
    /// A failure while moving in pauses the tour rather than leaving it stuck;
    /// any other failure is returned to the loop.
    fn settle_transition(&mut self, step: usize, outcome: TransitionOutcome) -> Result<(), TourError> {
        match outcome {
            TransitionOutcome::Completed => {
                self.metrics.record_flight_completed();
                self.block_remove(step, BLOCK_FLIGHT, Propagation::Mirror);
                Ok(())
            }
            TransitionOutcome::Interrupted => {
                self.block_discard(step, BLOCK_FLIGHT, Propagation::Mirror);
                self.metrics.record_flight_interrupted();
                self.diagnostics.record(Diagnostic::FlightInterrupted { step });
                debug!(tour_id = %self.id, step, "tourstop_flight_interrupted");
                Ok(())
            }
            TransitionOutcome::Failed(reason) => {
                self.block_discard(step, BLOCK_FLIGHT, Propagation::Mirror);
                if self.stops[step].state == StopState::TransitionIn && self.state != TourState::Paused {
                    warn!(tour_id = %self.id, step, reason = %reason, "tourstop_flight_failed_pausing");
                    self.metrics.record_flight_failed();
                    self.pause();
                    Ok(())
                } else {
                    Err(TourError::TransitionFailed { step, reason })
                }
            }
        }
    }

    /// Stop camera motion for a stop, settling it as interrupted
    fn cancel_motion(&mut self, step: usize) {
        let Some(task) = self.stops[step].transition.take() else {
            return;
        };
        self.animation.cancel_flight();
        let outcome = task.cancel();
        if let Err(e) = self.settle_transition(step, outcome) {
            warn!(tour_id = %self.id, step, error = %e, "tourstop_cancel_failed");
        }
    }

    /// Land on the stop and start waiting
    pub(crate) fn arrive_at_tourstop(&mut self, step: usize) {
        self.stops[step].wait_timer = None;
        if self.stops[step].state == StopState::Inactive {
            return;
        }

        // Arriving supersedes whatever motion is still running
        if let Some(task) = self.stops[step].transition.take() {
            self.animation.cancel_flight();
            task.cancel();
            self.block_discard(step, BLOCK_FLIGHT, Propagation::Mirror);
        }

        if let Some(target) = self.target_of(step) {
            let pos = self.stops[step].setting.pos.clone();
            if let Err(e) = self.animation.leap_to(target, pos.as_deref()) {
                warn!(tour_id = %self.id, step, error = %e, "tourstop_arrival_leap_failed");
            }
        }

        self.transition(step, StopState::ActiveWait);
        self.arm_wait_timer(step);
        self.stops[step].direction = Direction::Forward;

        self.metrics.record_stop_arrived();
        self.diagnostics.record(Diagnostic::ArrivedAtStop { step });
        info!(tour_id = %self.id, step, "tourstop_arrived");
        if let Some(on_show) = self.stops[step].hooks.on_show.clone() {
            on_show(step);
        }
    }

    /// Block the stop until its wait elapses, or until advanced by hand
    fn arm_wait_timer(&mut self, step: usize) {
        match self.stops[step].effective_wait() {
            None => self.block_add(step, BLOCK_MANUAL, Propagation::Mirror),
            Some(wait) => {
                self.block_add(step, BLOCK_TIMER, Propagation::Mirror);
                let timer = self
                    .scheduler
                    .schedule(wait, |timer| TourEvent::WaitElapsed { step, timer });
                self.stops[step].wait_timer = Some(timer);
                self.diagnostics
                    .record(Diagnostic::WaitTimerArmed { step, wait });
            }
        }
    }

    pub(crate) fn on_wait_elapsed(&mut self, step: usize, timer: TimerId) {
        let current = self
            .stops
            .get(step)
            .and_then(|stop| stop.wait_timer.as_ref())
            .map(|handle| handle.id());
        if current != Some(timer) {
            self.stale("wait_elapsed", Some(step));
            return;
        }
        self.stops[step].wait_timer = None;
        self.block_remove(step, BLOCK_TIMER, Propagation::Mirror);
    }

    /// Move on from a stop without waiting for its blocks
    pub(crate) fn advance(&mut self, step: usize) {
        match self.stops[step].state {
            StopState::TransitionIn => self.arrive_at_tourstop(step),
            StopState::ActiveWait => self.goto_next(),
            StopState::TransitionOut => self.exit_stop(step),
            StopState::Inactive => {
                debug!(tour_id = %self.id, step, "tourstop_advance_ignored");
            }
        }
    }

    pub(crate) fn leave(&mut self, step: usize) {
        if self.stops[step].state != StopState::TransitionOut {
            self.transition(step, StopState::TransitionOut);
        }
    }

    /// Tear a stop down to INACTIVE, cancelling its timers and motion
    pub(crate) fn exit_stop(&mut self, step: usize) {
        let was_active = self.stops[step].state != StopState::Inactive;

        // Tearing down must not drain the registry into an arrival or advance
        self.stops[step].wait_timer = None;
        self.block_discard(step, BLOCK_MANUAL, Propagation::Mirror);
        self.block_discard(step, BLOCK_TOURPAUSED, Propagation::Mirror);
        self.cancel_motion(step);
        self.transition(step, StopState::Inactive);

        if was_active {
            if let Some(on_exit) = self.stops[step].hooks.on_exit.clone() {
                on_exit(step);
            }
        }
    }

    pub(crate) fn pause_stop(&mut self, step: usize) {
        self.stops[step].wait_timer = None;
        self.block_add(step, BLOCK_TOURPAUSED, Propagation::Mirror);
        self.cancel_motion(step);
    }

    pub(crate) fn resume_stop(&mut self, step: usize) {
        match self.stops[step].state {
            StopState::Inactive | StopState::ActiveWait => {
                if let Some(target) = self.target_of(step) {
                    let pos = self.stops[step].setting.pos.clone();
                    if let Err(e) = self.animation.leap_to(target, pos.as_deref()) {
                        warn!(tour_id = %self.id, step, error = %e, "tourstop_resume_leap_failed");
                    }
                }
                self.arm_wait_timer(step);
            }
            StopState::TransitionIn | StopState::TransitionOut => {
                self.play(step, Direction::Forward);
            }
        }
        self.block_remove(step, BLOCK_TOURPAUSED, Propagation::Mirror);
    }
}
