//! Per-stop state owned by a tour
//!
//! A stop holds its lifecycle state, block registry and the handles of
//! whatever is running on its behalf (wait timer, camera motion). The
//! operations that move a stop between states live on the tour, which owns
//! every stop and addresses them by index.

use crate::domain::blocks::BlockRegistry;
use crate::domain::setting::StopSetting;
use crate::domain::types::{Direction, StopState};
use crate::services::scheduler::TimerHandle;
use crate::services::tour::StopHooks;
use crate::services::transition::TransitionTask;
use std::time::Duration;

#[derive(Debug)]
pub struct TourStop {
    pub(crate) step: usize,
    pub(crate) setting: StopSetting,
    pub(crate) hooks: StopHooks,
    pub(crate) state: StopState,
    pub(crate) direction: Direction,
    pub(crate) blocks: BlockRegistry,
    /// Bumped on every state change so deferred work can tell it is stale
    pub(crate) epoch: u64,
    pub(crate) wait_timer: Option<TimerHandle>,
    pub(crate) transition: Option<TransitionTask>,
}

impl TourStop {
    pub fn new(step: usize, setting: StopSetting, hooks: StopHooks) -> Self {
        Self {
            step,
            setting,
            hooks,
            state: StopState::Inactive,
            direction: Direction::Forward,
            blocks: BlockRegistry::new(),
            epoch: 0,
            wait_timer: None,
            transition: None,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn identifier(&self) -> Option<&str> {
        self.setting.identifier.as_deref()
    }

    pub fn setting(&self) -> &StopSetting {
        &self.setting
    }

    pub fn state(&self) -> StopState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn has_block(&self, block: &str) -> bool {
        self.blocks.contains(block)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_transitional(&self) -> bool {
        self.setting.is_transitional()
    }

    /// Camera motion (or its pre-motion delay) is running
    pub fn is_moving(&self) -> bool {
        self.transition.is_some()
    }

    /// Wait before auto-advancing, for the direction the stop was entered from
    pub fn effective_wait(&self) -> Option<Duration> {
        self.setting.wait_for(self.direction)
    }

    pub(crate) fn enter(&mut self, state: StopState) {
        self.state = state;
        self.epoch += 1;
    }
}
