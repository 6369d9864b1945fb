//! The sweep played when a merge lands

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, instrument};

use super::{Actuator, easing::Easing};
use crate::config::ServoConfig;

/// Angles for one sweep: from `min_angle` up to `max_angle` and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPlan {
    positions: Vec<u16>,
}

impl SweepPlan {
    pub fn new(min_angle: u16, max_angle: u16, steps: u32, easing: Easing) -> Self {
        let steps = steps.max(1);
        let (low, high) = (
            f32::from(min_angle.min(max_angle)),
            f32::from(min_angle.max(max_angle)),
        );
        let distance = high - low;
        let duration = steps as f32;

        let to_angle = |value: f32| value.round().clamp(low, high) as u16;

        let rising = (0..=steps).map(|t| to_angle(easing.apply(t as f32, low, distance, duration)));
        let falling =
            (1..=steps).map(|t| to_angle(easing.apply(t as f32, high, -distance, duration)));

        Self { positions: rising.chain(falling).collect() }
    }

    pub fn positions(&self) -> &[u16] {
        &self.positions
    }
}

/// Plays a sweep on an actuator for every detected merge, rotating through
/// the easing curves so consecutive merges look different.
#[derive(Debug)]
pub struct Celebration<A> {
    actuator: A,
    servo: ServoConfig,
    played: usize,
}

impl<A: Actuator> Celebration<A> {
    pub fn new(actuator: A, servo: ServoConfig) -> Self {
        Self { actuator, servo, played: 0 }
    }

    /// Easing curve the next celebration will use
    pub fn next_easing(&self) -> Easing {
        Easing::ALL[self.played % Easing::ALL.len()]
    }

    #[instrument(skip(self), fields(easing = %self.next_easing()))]
    pub async fn celebrate(&mut self) {
        let plan = SweepPlan::new(
            self.servo.min_angle,
            self.servo.max_angle,
            self.servo.steps,
            self.next_easing(),
        );
        let step_delay = Duration::from_millis(self.servo.step_delay_ms);

        info!(positions = plan.positions().len(), "Celebrating merge");
        for &angle in plan.positions() {
            self.actuator.set_angle(angle).await;
            if !step_delay.is_zero() {
                sleep(step_delay).await;
            }
        }

        self.played += 1;
        debug!(played = self.played, "Celebration finished");
    }

    #[cfg(test)]
    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}
