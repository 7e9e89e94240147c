//! Structured diagnostics for tour state changes
//!
//! Diagnostics are informational only; nothing in the tour reads them back.
//! The player binary routes them into tracing, tests record them.

use crate::domain::types::Direction;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    PlayingStop { step: usize, direction: Direction },
    /// `play` was called while motion toward the stop was already running
    ReentrantPlay { step: usize },
    ArrivedAtStop { step: usize },
    WaitTimerArmed { step: usize, wait: Duration },
    FlightInterrupted { step: usize },
    /// An event whose timer, task or epoch no longer matches and was dropped
    StaleEvent { kind: &'static str, step: Option<usize> },
    AutoActivateRescheduled { wait: Duration },
}

pub trait DiagnosticSink: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);
}

/// Drops every diagnostic
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl DiagnosticSink for NoopDiagnostics {
    fn record(&self, _diagnostic: Diagnostic) {}
}

/// Emits diagnostics as debug-level tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::PlayingStop { step, direction } => {
                debug!(step, direction = direction.as_str(), "diag_playing_stop");
            }
            Diagnostic::ReentrantPlay { step } => {
                debug!(step, "diag_reentrant_play");
            }
            Diagnostic::ArrivedAtStop { step } => {
                debug!(step, "diag_arrived");
            }
            Diagnostic::WaitTimerArmed { step, wait } => {
                debug!(step, wait_ms = %wait.as_millis(), "diag_wait_timer_armed");
            }
            Diagnostic::FlightInterrupted { step } => {
                debug!(step, "diag_flight_interrupted");
            }
            Diagnostic::StaleEvent { kind, step } => {
                debug!(kind, step = ?step, "diag_stale_event");
            }
            Diagnostic::AutoActivateRescheduled { wait } => {
                debug!(wait_ms = %wait.as_millis(), "diag_auto_activate_rescheduled");
            }
        }
    }
}
