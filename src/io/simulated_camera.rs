//! Camera that flies by sleeping
//!
//! Stands in for the tree renderer: flights take a configurable time scaled by
//! speed, can be cancelled, and can be made to fail for exercising recovery.

use crate::domain::errors::MotionError;
use crate::domain::types::{Easing, NodeId};
use crate::io::ports::AnimationPort;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Longest a single flight may take, however slow it is asked to be
pub const MAX_FLIGHT: Duration = Duration::from_secs(600);

pub struct SimulatedCamera {
    /// Flight duration at speed 1.0
    flight_time: Duration,
    /// Fail every n-th flight (0 never fails)
    fail_every: u64,
    position: Mutex<Option<NodeId>>,
    leaps: AtomicU64,
    flights: AtomicU64,
    pending_failure: Mutex<Option<String>>,
    cancel_tx: watch::Sender<u64>,
}

impl SimulatedCamera {
    pub fn new(flight_time: Duration) -> Self {
        let (cancel_tx, _) = watch::channel(0);
        Self {
            flight_time,
            fail_every: 0,
            position: Mutex::new(None),
            leaps: AtomicU64::new(0),
            flights: AtomicU64::new(0),
            pending_failure: Mutex::new(None),
            cancel_tx,
        }
    }

    pub fn with_fail_every(mut self, fail_every: u64) -> Self {
        self.fail_every = fail_every;
        self
    }

    /// Make the next flight fail with `reason`
    pub fn fail_next_flight(&self, reason: &str) {
        *self.pending_failure.lock() = Some(reason.to_string());
    }

    pub fn position(&self) -> Option<NodeId> {
        *self.position.lock()
    }

    pub fn leaps(&self) -> u64 {
        self.leaps.load(Ordering::Relaxed)
    }

    /// Flights started, including failed and cancelled ones
    pub fn flights(&self) -> u64 {
        self.flights.load(Ordering::Relaxed)
    }

    /// Flight time at `speed`, capped at [`MAX_FLIGHT`]
    fn flight_duration(&self, speed: f64) -> Duration {
        let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
        Duration::try_from_secs_f64(self.flight_time.as_secs_f64() / speed)
            .map_or(MAX_FLIGHT, |duration| duration.min(MAX_FLIGHT))
    }

    async fn fly(&self, target: NodeId, speed: f64, kind: &'static str) -> Result<(), MotionError> {
        if !target.is_valid() {
            return Err(MotionError::InvalidTarget(target));
        }
        let mut cancel_rx = self.cancel_tx.subscribe();
        let n = self.flights.fetch_add(1, Ordering::Relaxed) + 1;

        let injected = self.pending_failure.lock().take();
        if let Some(reason) = injected {
            return Err(MotionError::Failed(reason));
        }
        if self.fail_every > 0 && n % self.fail_every == 0 {
            return Err(MotionError::Failed(format!("simulated failure on flight {n}")));
        }

        let duration = self.flight_duration(speed);
        debug!(node = %target, kind, duration_ms = %duration.as_millis(), "camera_flight_started");
        tokio::select! {
            _ = tokio::time::sleep(duration) => {
                *self.position.lock() = Some(target);
                info!(node = %target, kind, "camera_flight_landed");
                Ok(())
            }
            _ = cancel_rx.changed() => {
                debug!(node = %target, kind, "camera_flight_cancelled");
                Err(MotionError::Interrupted)
            }
        }
    }
}

#[async_trait]
impl AnimationPort for SimulatedCamera {
    fn leap_to(&self, target: NodeId, pos: Option<&str>) -> Result<(), MotionError> {
        if !target.is_valid() {
            return Err(MotionError::InvalidTarget(target));
        }
        self.leaps.fetch_add(1, Ordering::Relaxed);
        *self.position.lock() = Some(target);
        info!(node = %target, pos = pos.unwrap_or(""), "camera_leap");
        Ok(())
    }

    async fn fly_on_tree_to(
        &self,
        _from: Option<NodeId>,
        target: NodeId,
        _into_node: bool,
        speed: f64,
    ) -> Result<(), MotionError> {
        self.fly(target, speed, "tree").await
    }

    async fn fly_straight_to(
        &self,
        target: NodeId,
        _into_node: bool,
        speed: f64,
        _easing: Easing,
    ) -> Result<(), MotionError> {
        self.fly(target, speed, "straight").await
    }

    fn cancel_flight(&self) {
        self.cancel_tx.send_modify(|generation| *generation += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_flight_lands_after_scaled_duration() {
        let camera = SimulatedCamera::new(Duration::from_millis(1000));
        let start = tokio::time::Instant::now();
        camera
            .fly_on_tree_to(None, NodeId(5), false, 2.0)
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(500));
        assert_eq!(camera.position(), Some(NodeId(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_flight() {
        let camera = Arc::new(SimulatedCamera::new(Duration::from_millis(1000)));
        let flying = Arc::clone(&camera);
        let flight = tokio::spawn(async move {
            flying
                .fly_straight_to(NodeId(9), false, 1.0, Easing::Linear)
                .await
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        camera.cancel_flight();
        assert_eq!(flight.await.unwrap(), Err(MotionError::Interrupted));
        assert_eq!(camera.position(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_injected_failures() {
        let camera = SimulatedCamera::new(Duration::from_millis(10)).with_fail_every(2);
        assert!(camera.fly_on_tree_to(None, NodeId(1), false, 1.0).await.is_ok());
        assert!(matches!(
            camera.fly_on_tree_to(None, NodeId(1), false, 1.0).await,
            Err(MotionError::Failed(_))
        ));

        camera.fail_next_flight("renderer gone");
        assert_eq!(
            camera.fly_on_tree_to(None, NodeId(1), false, 1.0).await,
            Err(MotionError::Failed("renderer gone".to_string()))
        );
        assert_eq!(camera.flights(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extreme_speed_is_capped() {
        let camera = SimulatedCamera::new(Duration::from_millis(1000));
        let start = tokio::time::Instant::now();
        camera
            .fly_on_tree_to(None, NodeId(5), false, 1e-300)
            .await
            .unwrap();
        assert_eq!(start.elapsed(), MAX_FLIGHT);
        assert_eq!(camera.flight_duration(f64::MAX), Duration::ZERO);
        assert_eq!(camera.flight_duration(f64::NAN), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_node_zero_is_rejected() {
        let camera = SimulatedCamera::new(Duration::from_millis(10));
        assert_eq!(
            camera.leap_to(NodeId(0), None),
            Err(MotionError::InvalidTarget(NodeId(0)))
        );
        assert_eq!(
            camera.fly_on_tree_to(None, NodeId(0), false, 1.0).await,
            Err(MotionError::InvalidTarget(NodeId(0)))
        );
        assert_eq!(camera.position(), None);
        assert_eq!(camera.leaps(), 0);
    }

    #[test]
    fn test_leap_moves_immediately() {
        let camera = SimulatedCamera::new(Duration::from_millis(10));
        camera.leap_to(NodeId(-42), Some("max")).unwrap();
        assert_eq!(camera.position(), Some(NodeId(-42)));
        assert_eq!(camera.leaps(), 1);
    }
}
