//! Shared types for the tour engine

use serde::{Deserialize, Serialize};

/// Stable taxon identifier used by tour definitions to name a stop's target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TaxonId(pub u64);

impl TaxonId {
    /// Taxon id 0 stands for "wherever the tour started"
    pub const INITIAL_LOCATION: TaxonId = TaxonId(0);
}

impl std::fmt::Display for TaxonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Internal navigable node identifier understood by the animation port.
/// Leaves are conventionally negative, interior nodes positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(pub i64);

impl NodeId {
    /// Zero is neither a leaf nor an interior node
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a single tour stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StopState {
    /// Hidden and inert
    #[default]
    Inactive,
    /// Camera moving toward this stop
    TransitionIn,
    /// Arrived, waiting on blocks
    ActiveWait,
    /// Leaving, handing over to the following stop
    TransitionOut,
}

impl StopState {
    /// Presentation class name reflecting this state
    pub fn as_str(&self) -> &'static str {
        match self {
            StopState::Inactive => "tsstate-inactive",
            StopState::TransitionIn => "tsstate-transition_in",
            StopState::ActiveWait => "tsstate-active_wait",
            StopState::TransitionOut => "tsstate-transition_out",
        }
    }

    /// True for either half of a hand-off between stops
    #[inline]
    pub fn is_transitioning(&self) -> bool {
        matches!(self, StopState::TransitionIn | StopState::TransitionOut)
    }
}

impl std::fmt::Display for StopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction a stop was entered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

/// Tour-level play state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TourState {
    #[default]
    Inactive,
    Playing,
    Paused,
}

impl TourState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TourState::Inactive => "tstate-inactive",
            TourState::Playing => "tstate-playing",
            TourState::Paused => "tstate-paused",
        }
    }
}

/// How the camera travels into a stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStyle {
    /// Jump straight there
    Leap,
    /// Follow the tree path
    #[default]
    Fly,
    /// Straight-line flight, ignoring the tree
    FlyStraight,
}

/// Easing curve requested for straight flights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
}

/// What happens when the visitor interacts with the visualization mid-tour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionEffect {
    #[default]
    None,
    /// Interaction is disabled while the tour runs
    Block,
    /// Any interaction exits the tour
    Exit,
    /// Interaction pauses the tour and asks before exiting
    ExitAfterConfirmation,
}

impl InteractionEffect {
    /// Whether visualization interaction is disabled while the tour runs
    pub fn disables_interaction(&self) -> bool {
        !matches!(self, InteractionEffect::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_state_classes() {
        assert_eq!(StopState::Inactive.as_str(), "tsstate-inactive");
        assert_eq!(StopState::ActiveWait.to_string(), "tsstate-active_wait");
        assert!(StopState::TransitionIn.is_transitioning());
        assert!(StopState::TransitionOut.is_transitioning());
        assert!(!StopState::ActiveWait.is_transitioning());
    }

    #[test]
    fn test_transition_style_names() {
        let style: TransitionStyle = serde_json::from_str("\"fly_straight\"").unwrap();
        assert_eq!(style, TransitionStyle::FlyStraight);
        let style: TransitionStyle = serde_json::from_str("\"leap\"").unwrap();
        assert_eq!(style, TransitionStyle::Leap);
    }

    #[test]
    fn test_interaction_effect_disables() {
        assert!(!InteractionEffect::None.disables_interaction());
        assert!(InteractionEffect::Block.disables_interaction());
        assert!(InteractionEffect::Exit.disables_interaction());
        assert!(InteractionEffect::ExitAfterConfirmation.disables_interaction());
    }
}
