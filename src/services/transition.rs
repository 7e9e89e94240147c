//! Cancellable camera motion toward a stop
//!
//! A [`TransitionTask`] runs the optional pre-motion delay and then the
//! [`MotionPlan`] on its own tokio task. When it finishes it posts a
//! `TransitionSettled` event carrying a typed [`TransitionOutcome`]; it never
//! touches tour state directly.

use crate::domain::errors::MotionError;
use crate::domain::setting::StopSetting;
use crate::domain::types::{Direction, Easing, NodeId, TransitionStyle};
use crate::io::ports::AnimationPort;
use crate::services::tour::TourEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one transition task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

/// What the camera does to reach a stop
#[derive(Debug, Clone, PartialEq)]
pub enum MotionPlan {
    /// No target: nothing to move, arrive straight away
    Arrive,
    Leap {
        target: NodeId,
        pos: Option<String>,
    },
    FlyOnTree {
        target: NodeId,
        into_node: bool,
        speed: f64,
    },
    FlyStraight {
        target: NodeId,
        into_node: bool,
        speed: f64,
    },
}

impl MotionPlan {
    /// Backward navigation always leaps so the visitor is not kept waiting
    pub fn for_stop(setting: &StopSetting, target: Option<NodeId>, direction: Direction) -> Self {
        let Some(target) = target else {
            return MotionPlan::Arrive;
        };
        if direction == Direction::Backward || setting.transition_in == TransitionStyle::Leap {
            return MotionPlan::Leap {
                target,
                pos: setting.pos.clone(),
            };
        }
        let into_node = setting.into_node;
        let speed = setting.fly_speed();
        match setting.transition_in {
            TransitionStyle::FlyStraight => MotionPlan::FlyStraight {
                target,
                into_node,
                speed,
            },
            _ => MotionPlan::FlyOnTree {
                target,
                into_node,
                speed,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MotionPlan::Arrive => "arrive",
            MotionPlan::Leap { .. } => "leap",
            MotionPlan::FlyOnTree { .. } => "fly",
            MotionPlan::FlyStraight { .. } => "fly_straight",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Completed,
    Interrupted,
    Failed(String),
}

impl From<Result<(), MotionError>> for TransitionOutcome {
    fn from(result: Result<(), MotionError>) -> Self {
        match result {
            Ok(()) => TransitionOutcome::Completed,
            Err(MotionError::Interrupted) => TransitionOutcome::Interrupted,
            Err(e) => TransitionOutcome::Failed(e.to_string()),
        }
    }
}

/// Handle onto a running transition
#[derive(Debug)]
pub struct TransitionTask {
    id: TaskId,
    handle: JoinHandle<()>,
}

impl TransitionTask {
    pub fn spawn(
        id: TaskId,
        step: usize,
        delay: Option<Duration>,
        plan: MotionPlan,
        port: Arc<dyn AnimationPort>,
        events_tx: mpsc::UnboundedSender<TourEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let outcome = perform(&plan, port.as_ref()).await;
            let _ = events_tx.send(TourEvent::TransitionSettled {
                step,
                task: id,
                outcome,
            });
        });
        Self { id, handle }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Abort the task. It will not report; the caller settles it with the
    /// returned outcome instead.
    pub fn cancel(self) -> TransitionOutcome {
        self.handle.abort();
        TransitionOutcome::Interrupted
    }
}

async fn perform(plan: &MotionPlan, port: &dyn AnimationPort) -> TransitionOutcome {
    let result = match plan {
        MotionPlan::Arrive => Ok(()),
        MotionPlan::Leap { target, pos } => port.leap_to(*target, pos.as_deref()),
        MotionPlan::FlyOnTree {
            target,
            into_node,
            speed,
        } => port.fly_on_tree_to(None, *target, *into_node, *speed).await,
        MotionPlan::FlyStraight {
            target,
            into_node,
            speed,
        } => {
            port.fly_straight_to(*target, *into_node, *speed, Easing::Linear)
                .await
        }
    };
    result.into()
}
