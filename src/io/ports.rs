//! Seams between the tour engine and its host
//!
//! The engine drives the camera through [`AnimationPort`], asks an
//! [`IdResolver`] to map taxon ids onto tree nodes, and reports everything a
//! UI would show through [`Presentation`].

use crate::domain::errors::MotionError;
use crate::domain::setting::ContentDirective;
use crate::domain::types::{Easing, NodeId, StopState, TaxonId};
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Camera control over the tree visualization
#[async_trait]
pub trait AnimationPort: Send + Sync {
    /// Jump to `target` without animation
    fn leap_to(&self, target: NodeId, pos: Option<&str>) -> Result<(), MotionError>;

    /// Fly along the tree from `from` (current position when `None`)
    async fn fly_on_tree_to(
        &self,
        from: Option<NodeId>,
        target: NodeId,
        into_node: bool,
        speed: f64,
    ) -> Result<(), MotionError>;

    /// Fly in a straight line
    async fn fly_straight_to(
        &self,
        target: NodeId,
        into_node: bool,
        speed: f64,
        easing: Easing,
    ) -> Result<(), MotionError>;

    /// Stop any running flight; the flight reports `MotionError::Interrupted`
    fn cancel_flight(&self);
}

/// Maps taxon ids onto tree node ids
#[async_trait]
pub trait IdResolver: Send + Sync {
    /// Ids missing from the result could not be resolved
    async fn resolve(&self, ids: Vec<TaxonId>) -> FxHashMap<TaxonId, NodeId>;
}

/// Everything about the tour a UI would render
///
/// All methods except `stop_state_changed` default to doing nothing.
pub trait Presentation: Send {
    fn stop_state_changed(&mut self, step: usize, state: StopState);

    fn block_added(&mut self, _step: usize, _block: &str) {}

    fn block_removed(&mut self, _step: usize, _block: &str) {}

    /// Tour styling applied (`true`) or removed (`false`)
    fn tour_style_enabled(&mut self, _enabled: bool) {}

    /// Apply a stop's content directives. Returns the class names that
    /// matched nothing in the rendered stop.
    fn render_content(
        &mut self,
        _step: usize,
        _content: &BTreeMap<String, ContentDirective>,
    ) -> Vec<String> {
        Vec::new()
    }

    fn exit_confirmation_visible(&mut self, _visible: bool) {}
}

/// Presentation for headless tours
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresentation;

impl Presentation for NullPresentation {
    fn stop_state_changed(&mut self, _step: usize, _state: StopState) {}
}
