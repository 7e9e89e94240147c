//! Domain models - tour definitions and core types
//!
//! This module contains the canonical data types used throughout the engine:
//! - `types` - ids, stop and tour states, directions, transition styles
//! - `setting` - tour definitions, shared/per-stop merging and validation
//! - `blocks` - the per-stop block registry
//! - `errors` - configuration, motion and tour errors

pub mod blocks;
pub mod errors;
pub mod setting;
pub mod types;

// Re-export commonly used types at module level
pub use errors::{ConfigError, MotionError, TourError};
pub use setting::{StopSetting, TourSetting};
pub use types::{Direction, NodeId, StopState, TaxonId, TourState};
