//! Tour engine and its event loop
//!
//! The Tour owns every stop and is the only thing that mutates tour or stop
//! state. Everything asynchronous (wait timers, camera motion, id resolution,
//! auto-activation) runs on spawned tasks that post a [`TourEvent`] back onto
//! the tour's channel. Events carry the id of the timer or task that produced
//! them, and are dropped when that no longer matches what the stop holds.
//!
//! Handlers are split by concern:
//! - `stop_flow` - play, arrive, advance, leave, exit, pause and resume of a stop
//! - `blocks` - block registry changes and what they trigger
//! - `navigation` - start, next, prev, exit, pause, continue and visitor interaction
//! - `auto_activate` - starting the tour after a period of inactivity

mod auto_activate;
mod blocks;
mod navigation;
mod stop_flow;

pub(crate) use blocks::Propagation;

use crate::domain::errors::TourError;
use crate::domain::setting::TourSetting;
use crate::domain::types::{InteractionEffect, NodeId, StopState, TaxonId, TourState};
use crate::infra::diagnostics::{Diagnostic, DiagnosticSink, NoopDiagnostics};
use crate::infra::metrics::Metrics;
use crate::io::ports::{AnimationPort, IdResolver, NullPresentation, Presentation};
use crate::services::activity::ActivityMonitor;
use crate::services::scheduler::{Scheduler, TimerHandle, TimerId};
use crate::services::tour_stop::TourStop;
use crate::services::transition::{TaskId, TransitionOutcome};
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

static NEXT_TOUR_ID: AtomicU64 = AtomicU64::new(1);

/// Requests from the host (buttons, keyboard, embedding page)
#[derive(Debug, Clone, PartialEq)]
pub enum TourCommand {
    Start,
    Next,
    Prev,
    Exit,
    Pause,
    Continue,
    /// Advance the current stop as if its wait had elapsed
    Advance,
    BlockAdd(String),
    BlockRemove(String),
    BlockToggle(String, Option<bool>),
    /// Visitor touched the visualization while the tour was showing
    Interaction,
    ExitConfirmed,
    ExitCancelled,
    /// Visitor activity outside the tour (resets the inactivity clock)
    Activity,
}

/// Everything the tour loop reacts to
#[derive(Debug)]
pub enum TourEvent {
    Command(TourCommand),
    TransitionSettled {
        step: usize,
        task: TaskId,
        outcome: TransitionOutcome,
    },
    WaitElapsed { step: usize, timer: TimerId },
    /// Blocks on an ACTIVE_WAIT stop drained; move on unless the stop changed since
    AdvanceDeferred { step: usize, epoch: u64 },
    AutoActivate { timer: TimerId },
    TargetsResolved(FxHashMap<TaxonId, NodeId>),
}

pub type TourEvents = mpsc::UnboundedReceiver<TourEvent>;

/// Cloneable sender of commands into a running tour
#[derive(Debug, Clone)]
pub struct TourHandle {
    events_tx: mpsc::UnboundedSender<TourEvent>,
}

impl TourHandle {
    /// Returns false once the tour loop has gone away
    pub fn send(&self, command: TourCommand) -> bool {
        self.events_tx.send(TourEvent::Command(command)).is_ok()
    }
}

pub type Callback = Arc<dyn Fn() + Send + Sync>;
pub type Condition = Arc<dyn Fn() -> bool + Send + Sync>;
pub type StopCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// Callbacks for one stop, keyed by its identifier in [`TourHooks::stops`]
#[derive(Clone, Default)]
pub struct StopHooks {
    /// Motion into the stop begins
    pub on_start: Option<StopCallback>,
    /// The stop reached ACTIVE_WAIT
    pub on_show: Option<StopCallback>,
    pub on_exit: Option<StopCallback>,
}

impl std::fmt::Debug for StopHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHooks")
            .field("on_start", &self.on_start.is_some())
            .field("on_show", &self.on_show.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct TourHooks {
    pub on_start: Option<Callback>,
    /// Called when the tour exits with callbacks requested
    pub on_exit: Option<Callback>,
    /// Extra condition for auto-activation; absent means always allowed
    pub auto_activate_condition: Option<Condition>,
    pub stops: HashMap<String, StopHooks>,
}

/// Host-provided collaborators
pub struct TourPorts {
    pub animation: Arc<dyn AnimationPort>,
    pub resolver: Option<Arc<dyn IdResolver>>,
    pub presentation: Box<dyn Presentation>,
    pub diagnostics: Arc<dyn DiagnosticSink>,
    pub activity: ActivityMonitor,
    pub metrics: Arc<Metrics>,
}

impl TourPorts {
    /// Headless ports around a camera: no resolver, no presentation, no diagnostics
    pub fn new(animation: Arc<dyn AnimationPort>) -> Self {
        Self {
            animation,
            resolver: None,
            presentation: Box::new(NullPresentation),
            diagnostics: Arc::new(NoopDiagnostics),
            activity: ActivityMonitor::new(),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn IdResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_presentation(mut self, presentation: Box<dyn Presentation>) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_activity(mut self, activity: ActivityMonitor) -> Self {
        self.activity = activity;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

pub struct Tour {
    pub(crate) id: u64,
    pub(crate) setting: TourSetting,
    pub(crate) stops: Vec<TourStop>,
    pub(crate) curr_step: Option<usize>,
    /// Stop left most recently; the other half of a transition
    pub(crate) prev_step: Option<usize>,
    pub(crate) started: bool,
    pub(crate) state: TourState,
    pub(crate) auto_timer: Option<TimerHandle>,
    /// Resolved tree nodes for stop targets
    pub(crate) targets: FxHashMap<TaxonId, NodeId>,
    pub(crate) on_start: Option<Callback>,
    pub(crate) on_exit: Option<Callback>,
    pub(crate) auto_activate_condition: Option<Condition>,
    pub(crate) scheduler: Scheduler,
    pub(crate) animation: Arc<dyn AnimationPort>,
    pub(crate) presentation: Box<dyn Presentation>,
    pub(crate) diagnostics: Arc<dyn DiagnosticSink>,
    pub(crate) activity: ActivityMonitor,
    pub(crate) metrics: Arc<Metrics>,
}

impl Tour {
    /// Build a tour, start resolving its targets and arm auto-activation
    ///
    /// Must be called inside a tokio runtime. The returned receiver is what
    /// [`Tour::run`] consumes.
    pub fn setup(setting: TourSetting, ports: TourPorts, mut hooks: TourHooks) -> (Self, TourEvents) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let id = NEXT_TOUR_ID.fetch_add(1, Ordering::Relaxed);

        let stops: Vec<TourStop> = setting
            .stops
            .iter()
            .enumerate()
            .map(|(step, stop)| {
                let stop_hooks = stop
                    .identifier
                    .as_ref()
                    .and_then(|identifier| hooks.stops.remove(identifier))
                    .unwrap_or_default();
                TourStop::new(step, stop.clone(), stop_hooks)
            })
            .collect();

        for identifier in hooks.stops.keys() {
            warn!(tour_id = %id, identifier = %identifier, "tourstop_hooks_unmatched");
        }

        let mut tour = Self {
            id,
            setting,
            stops,
            curr_step: None,
            prev_step: None,
            started: false,
            state: TourState::Inactive,
            auto_timer: None,
            targets: FxHashMap::default(),
            on_start: hooks.on_start,
            on_exit: hooks.on_exit,
            auto_activate_condition: hooks.auto_activate_condition,
            scheduler: Scheduler::new(events_tx),
            animation: ports.animation,
            presentation: ports.presentation,
            diagnostics: ports.diagnostics,
            activity: ports.activity,
            metrics: ports.metrics,
        };

        tour.check_references();
        tour.resolve_targets(ports.resolver);
        tour.set_auto_start();

        info!(
            tour_id = %tour.id,
            name = tour.setting.name.as_deref().unwrap_or(""),
            stops = tour.stops.len(),
            "tour_setup"
        );
        (tour, events_rx)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn handle(&self) -> TourHandle {
        TourHandle {
            events_tx: self.scheduler.sender(),
        }
    }

    pub fn setting(&self) -> &TourSetting {
        &self.setting
    }

    pub fn stops(&self) -> &[TourStop] {
        &self.stops
    }

    pub fn stop(&self, step: usize) -> Option<&TourStop> {
        self.stops.get(step)
    }

    pub fn curr_step(&self) -> Option<usize> {
        self.curr_step
    }

    pub fn curr_stop(&self) -> Option<&TourStop> {
        self.curr_step.and_then(|step| self.stops.get(step))
    }

    pub fn prev_step(&self) -> Option<usize> {
        self.prev_step
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn state(&self) -> TourState {
        self.state
    }

    pub fn auto_activation_armed(&self) -> bool {
        self.auto_timer.is_some()
    }

    /// Consume events until the channel closes or shutdown is signalled
    pub async fn run(&mut self, mut events: TourEvents, mut shutdown: watch::Receiver<bool>) {
        info!(tour_id = %self.id, "tour_loop_started");
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            if let Err(e) = self.handle_event(event) {
                                error!(tour_id = %self.id, error = %e, "tour_event_failed");
                            }
                        }
                        None => break,
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        if self.started {
            self.exit(false);
        }
        info!(tour_id = %self.id, "tour_loop_stopped");
    }

    /// Apply one event to tour state
    pub fn handle_event(&mut self, event: TourEvent) -> Result<(), TourError> {
        let handle_start = Instant::now();

        let result = match event {
            TourEvent::Command(command) => {
                self.handle_command(command);
                Ok(())
            }
            TourEvent::TransitionSettled { step, task, outcome } => {
                self.on_transition_settled(step, task, outcome)
            }
            TourEvent::WaitElapsed { step, timer } => {
                self.on_wait_elapsed(step, timer);
                Ok(())
            }
            TourEvent::AdvanceDeferred { step, epoch } => {
                self.on_advance_deferred(step, epoch);
                Ok(())
            }
            TourEvent::AutoActivate { timer } => {
                self.on_auto_activate(timer);
                Ok(())
            }
            TourEvent::TargetsResolved(resolved) => {
                self.on_targets_resolved(resolved);
                Ok(())
            }
        };

        self.metrics
            .record_event_handled(handle_start.elapsed().as_micros() as u64);
        result
    }

    fn handle_command(&mut self, command: TourCommand) {
        debug!(tour_id = %self.id, command = ?command, "tour_command");
        match command {
            TourCommand::Start => self.start(),
            TourCommand::Next => self.goto_next(),
            TourCommand::Prev => self.goto_prev(),
            TourCommand::Exit => self.exit(true),
            TourCommand::Pause => self.pause(),
            TourCommand::Continue => self.resume(),
            TourCommand::Advance => {
                if let Some(step) = self.curr_step {
                    self.advance(step);
                }
            }
            TourCommand::BlockAdd(block) => {
                if let Some(step) = self.curr_step {
                    self.block_add(step, &block, Propagation::Mirror);
                }
            }
            TourCommand::BlockRemove(block) => {
                if let Some(step) = self.curr_step {
                    self.block_remove(step, &block, Propagation::Mirror);
                }
            }
            TourCommand::BlockToggle(block, condition) => {
                if let Some(step) = self.curr_step {
                    self.block_toggle(step, &block, condition);
                }
            }
            TourCommand::Interaction => self.on_interaction(),
            TourCommand::ExitConfirmed => self.confirm_exit(),
            TourCommand::ExitCancelled => self.cancel_exit(),
            TourCommand::Activity => self.activity.note_activity(),
        }
    }

    /// Drop an event that no longer applies
    pub(crate) fn stale(&self, kind: &'static str, step: Option<usize>) {
        debug!(tour_id = %self.id, kind, step = ?step, "tour_stale_event");
        self.metrics.record_stale_event();
        self.diagnostics.record(Diagnostic::StaleEvent { kind, step });
    }

    /// Tree node the stop should move to, if known
    pub(crate) fn target_of(&self, step: usize) -> Option<NodeId> {
        match self.stops[step].setting.target_id? {
            TaxonId::INITIAL_LOCATION => self.setting.rough_initial_loc,
            taxon => {
                let node = self.targets.get(&taxon).copied();
                if node.is_none() {
                    debug!(tour_id = %self.id, step, taxon = %taxon, "tourstop_target_pending");
                }
                node
            }
        }
    }

    /// Log references the tour cannot honour; the tour still runs without them
    fn check_references(&self) {
        let interaction = &self.setting.interaction;
        if interaction.effect == InteractionEffect::ExitAfterConfirmation
            && interaction.confirm_template.is_none()
        {
            error!(tour_id = %self.id, "tour_confirm_template_missing");
        }
        if self.setting.rough_initial_loc.is_none() {
            for stop in &self.stops {
                if stop.setting.target_id == Some(TaxonId::INITIAL_LOCATION) {
                    error!(tour_id = %self.id, step = stop.step, "tourstop_initial_location_missing");
                }
            }
        }
    }

    fn resolve_targets(&mut self, resolver: Option<Arc<dyn IdResolver>>) {
        let ids = self.setting.target_ids();
        if ids.is_empty() {
            return;
        }
        let Some(resolver) = resolver else {
            warn!(tour_id = %self.id, targets = ids.len(), "tour_no_resolver");
            return;
        };
        let events_tx = self.scheduler.sender();
        tokio::spawn(async move {
            let resolved = resolver.resolve(ids).await;
            let _ = events_tx.send(TourEvent::TargetsResolved(resolved));
        });
    }

    fn on_targets_resolved(&mut self, resolved: FxHashMap<TaxonId, NodeId>) {
        self.targets.extend(resolved);
        for taxon in self.setting.target_ids() {
            if !self.targets.contains_key(&taxon) {
                warn!(tour_id = %self.id, taxon = %taxon, "tourstop_target_unresolved");
            }
        }
        info!(tour_id = %self.id, resolved = self.targets.len(), "tour_targets_resolved");
    }

    /// Set a stop's state, clearing its blocks
    pub(crate) fn transition(&mut self, step: usize, state: StopState) {
        let previous = self.stops[step].state;
        self.stops[step].enter(state);
        self.presentation.stop_state_changed(step, state);
        self.block_clear(step);
        debug!(
            tour_id = %self.id,
            step,
            from = previous.as_str(),
            to = state.as_str(),
            "tourstop_state_changed"
        );
    }
}
