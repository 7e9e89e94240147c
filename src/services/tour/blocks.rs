//! Block registry operations
//!
//! While a stop is transitioning, blocks added or removed on it are mirrored
//! (prefixed `trans-`) onto the other stop of the transition, so styling on
//! the outgoing stop can follow what the incoming one is waiting for.
//! Draining a stop's registry is what moves it along: an ACTIVE_WAIT stop
//! schedules the next stop, a TRANSITION_IN stop arrives.

use super::{Tour, TourEvent};
use crate::domain::blocks::mirrored;
use crate::domain::types::StopState;
use tracing::debug;

/// Whether a block change is mirrored onto the transition pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Mirror,
    Local,
}

impl Tour {
    /// The stop on the other side of a transition involving `step`
    pub(crate) fn transition_pair(&self, step: usize) -> Option<usize> {
        let curr = self.curr_step?;
        if curr != step {
            Some(curr)
        } else {
            self.prev_step.filter(|&prev| prev != step)
        }
    }

    pub(crate) fn block_add(&mut self, step: usize, block: &str, propagation: Propagation) {
        if self.stops[step].blocks.insert(block) {
            self.presentation.block_added(step, block);
        }
        if propagation == Propagation::Mirror && self.stops[step].state.is_transitioning() {
            if let Some(pair) = self.transition_pair(step) {
                self.block_add(pair, &mirrored(block), Propagation::Local);
            }
        }
    }

    /// Remove a block, moving the stop along if that drained its registry
    pub(crate) fn block_remove(&mut self, step: usize, block: &str, propagation: Propagation) {
        if self.block_discard(step, block, propagation) {
            self.on_blocks_drained(step);
        }
    }

    /// Remove a block without acting on the result. Returns true if the
    /// registry went from non-empty to empty.
    pub(crate) fn block_discard(&mut self, step: usize, block: &str, propagation: Propagation) -> bool {
        if self.stops[step].blocks.is_empty() {
            return false;
        }
        if self.stops[step].blocks.remove(block) {
            self.presentation.block_removed(step, block);
        }
        if propagation == Propagation::Mirror {
            if let Some(pair) = self.transition_pair(step) {
                self.block_remove(pair, &mirrored(block), Propagation::Local);
            }
        }
        self.stops[step].blocks.is_empty()
    }

    /// Add the block if `condition` (or, without one, if it is absent)
    pub(crate) fn block_toggle(&mut self, step: usize, block: &str, condition: Option<bool>) {
        let add = condition.unwrap_or_else(|| !self.stops[step].blocks.contains(block));
        if add {
            self.block_add(step, block, Propagation::Mirror);
        } else {
            self.block_remove(step, block, Propagation::Mirror);
        }
    }

    /// Drop every block without triggering anything
    pub(crate) fn block_clear(&mut self, step: usize) {
        for block in self.stops[step].blocks.drain() {
            self.presentation.block_removed(step, &block);
        }
    }

    fn on_blocks_drained(&mut self, step: usize) {
        match self.stops[step].state {
            StopState::ActiveWait => {
                // Let whatever removed the block finish before moving on
                let epoch = self.stops[step].epoch;
                self.scheduler.defer(TourEvent::AdvanceDeferred { step, epoch });
            }
            StopState::TransitionIn => self.arrive_at_tourstop(step),
            StopState::Inactive | StopState::TransitionOut => {}
        }
    }

    pub(crate) fn on_advance_deferred(&mut self, step: usize, epoch: u64) {
        let still_waiting = self.started
            && self.curr_step == Some(step)
            && self.stops[step].epoch == epoch
            && self.stops[step].state == StopState::ActiveWait
            && self.stops[step].blocks.is_empty();
        if !still_waiting {
            self.stale("advance_deferred", Some(step));
            return;
        }
        debug!(tour_id = %self.id, step, "tourstop_wait_over");
        self.goto_next();
    }
}
