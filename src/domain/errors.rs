//! Error types for tour definitions, camera motion and navigation

use crate::domain::types::NodeId;
use thiserror::Error;

/// A tour definition that cannot be turned into a tour
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tour must have at least one tourstop")]
    NoStops,

    #[error("tourstop identifier {0:?} is used more than once")]
    DuplicateIdentifier(String),

    #[error("tourstop {index} is invalid: {source}")]
    InvalidStop {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("tour definition is invalid: {0}")]
    InvalidTour(#[from] serde_json::Error),
}

/// Failure reported by the animation port
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    /// The motion was cancelled before it finished
    #[error("motion interrupted")]
    Interrupted,

    #[error("invalid motion target {0}")]
    InvalidTarget(NodeId),

    #[error("motion failed: {0}")]
    Failed(String),
}

/// Failure surfaced by the tour event loop
#[derive(Debug, Error)]
pub enum TourError {
    /// A stop's motion failed outside the recoverable cases
    #[error("transition into tourstop {step} failed: {reason}")]
    TransitionFailed { step: usize, reason: String },
}
