//! Output side: whatever moves when a merge is detected

use std::future::Future;

use tracing::trace;

pub mod celebration;
pub mod easing;

pub use celebration::Celebration;

/// Something that can be driven to an angle, typically a hobby servo.
pub trait Actuator {
    fn set_angle(&mut self, angle: u16) -> impl Future<Output = ()>;
}

/// Stand-in servo that reports positions through tracing
#[derive(Debug, Default)]
pub struct TracingServo {
    angle: Option<u16>,
    moves: u64,
}

#[cfg(test)]
impl TracingServo {
    pub fn angle(&self) -> Option<u16> {
        self.angle
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }
}

impl Actuator for TracingServo {
    async fn set_angle(&mut self, angle: u16) {
        if self.angle != Some(angle) {
            trace!(angle, "servo move");
            self.moves += 1;
        }
        self.angle = Some(angle);
    }
}
