//! Tour-level navigation and visitor interaction

use super::Tour;
use crate::domain::types::{Direction, InteractionEffect, StopState, TourState};
use tracing::{debug, error, info};

impl Tour {
    /// Start (or restart) the tour from the first stop
    pub fn start(&mut self) {
        self.exit(false);

        self.presentation.tour_style_enabled(true);
        self.started = true;
        self.state = TourState::Playing;
        self.curr_step = None;
        self.goto_next();

        self.auto_timer = None;
        if self.setting.interaction.effect.disables_interaction() {
            self.activity.set_interaction_disabled(true);
        }

        self.metrics.record_tour_started();
        info!(
            tour_id = %self.id,
            name = self.setting.name.as_deref().unwrap_or(""),
            stops = self.stops.len(),
            "tour_started"
        );
        if let Some(on_start) = self.on_start.clone() {
            on_start();
        }
    }

    pub fn goto_next(&mut self) {
        if !self.started {
            return;
        }

        if let Some(curr) = self.curr_step {
            let stop = &self.stops[curr];
            if stop.is_transitional() && stop.state() == StopState::TransitionIn {
                // Finish the transitional stop's motion rather than skipping past it
                debug!(tour_id = %self.id, step = curr, "tourstop_transition_finished_early");
                self.advance(curr);
                return;
            }
            self.leave(curr);
            self.exit_stop(curr);
            self.prev_step = Some(curr);
        }

        let next = self.curr_step.map_or(0, |step| step + 1);
        if next >= self.stops.len() {
            info!(tour_id = %self.id, "tour_finished");
            self.exit(true);
            return;
        }

        // Navigating out of a pause plays the next stop normally
        self.state = TourState::Playing;
        self.curr_step = Some(next);
        self.play(next, Direction::Forward);
        self.render_content(next);
    }

    /// Step back, skipping transitional stops (never past the first stop)
    pub fn goto_prev(&mut self) {
        if !self.started {
            return;
        }

        if let Some(curr) = self.curr_step {
            self.leave(curr);
            self.exit_stop(curr);
            self.prev_step = Some(curr);
        }

        let mut step = self.curr_step.unwrap_or(0);
        if step > 0 {
            step -= 1;
            while step > 0 && self.stops[step].is_transitional() {
                step -= 1;
            }
        }

        self.state = TourState::Playing;
        self.curr_step = Some(step);
        self.play(step, Direction::Backward);
        self.render_content(step);
    }

    /// Leave the tour. `invoke_callback` controls whether `on_exit` runs.
    pub fn exit(&mut self, invoke_callback: bool) {
        let was_started = self.started;

        if let Some(curr) = self.curr_step {
            self.exit_stop(curr);
        }

        self.presentation.tour_style_enabled(false);
        self.started = false;
        self.state = TourState::Inactive;
        self.curr_step = None;
        self.prev_step = None;

        self.set_auto_start();
        self.activity.set_interaction_disabled(false);

        if was_started {
            self.metrics.record_tour_exited();
            info!(tour_id = %self.id, "tour_exited");
        }
        if invoke_callback {
            if let Some(on_exit) = self.on_exit.clone() {
                on_exit();
            }
        }
    }

    pub fn pause(&mut self) {
        let Some(curr) = self.curr_step else {
            return;
        };
        self.state = TourState::Paused;
        self.pause_stop(curr);
        info!(tour_id = %self.id, step = curr, "tour_paused");
    }

    /// The tour's `continue` operation
    pub fn resume(&mut self) {
        let Some(curr) = self.curr_step else {
            return;
        };
        self.state = TourState::Playing;
        self.resume_stop(curr);
        info!(tour_id = %self.id, step = curr, "tour_resumed");
    }

    /// Visitor touched the visualization
    pub(crate) fn on_interaction(&mut self) {
        self.activity.note_activity();
        if !self.started {
            return;
        }
        match self.setting.interaction.effect {
            InteractionEffect::Exit => {
                info!(tour_id = %self.id, "tour_exit_on_interaction");
                self.exit(true);
            }
            InteractionEffect::ExitAfterConfirmation => {
                if self.setting.interaction.confirm_template.is_none() {
                    return;
                }
                self.pause();
                self.presentation.exit_confirmation_visible(true);
            }
            InteractionEffect::None | InteractionEffect::Block => {}
        }
    }

    pub(crate) fn confirm_exit(&mut self) {
        self.presentation.exit_confirmation_visible(false);
        self.exit(true);
    }

    pub(crate) fn cancel_exit(&mut self) {
        self.presentation.exit_confirmation_visible(false);
        self.resume();
    }

    fn render_content(&mut self, step: usize) {
        let missing = self
            .presentation
            .render_content(step, &self.stops[step].setting.update_class);
        for class in missing {
            error!(tour_id = %self.id, step, class = %class, "tourstop_content_target_missing");
        }
    }
}
