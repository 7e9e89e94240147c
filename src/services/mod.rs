//! Services - tour state and the work it schedules
//!
//! This module contains the engine itself:
//! - `tour` - the Tour, its event loop and navigation
//! - `tour_stop` - per-stop state owned by the tour
//! - `transition` - cancellable camera motion toward a stop
//! - `scheduler` - timers posting events back to the tour loop
//! - `activity` - visitor activity shared with the host

pub mod activity;
pub mod scheduler;
pub mod tour;
pub mod tour_stop;
pub mod transition;

// Re-export commonly used types
pub use activity::ActivityMonitor;
pub use tour::{StopHooks, Tour, TourCommand, TourEvent, TourHandle, TourHooks, TourPorts};
pub use tour_stop::TourStop;
