//! Robert Penner's easing equations, `(time, start, distance, duration)`

use std::f32::consts::FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    InSine,
    OutSine,
    InQuadratic,
    OutQuadratic,
    Linear,
}

impl Easing {
    pub const ALL: [Easing; 5] = [
        Easing::InSine,
        Easing::OutSine,
        Easing::InQuadratic,
        Easing::OutQuadratic,
        Easing::Linear,
    ];

    /// Value at `time` of a move from `start` covering `distance` over
    /// `duration`.
    pub fn apply(self, time: f32, start: f32, distance: f32, duration: f32) -> f32 {
        if duration <= 0.0 {
            return start + distance;
        }

        let t = (time / duration).clamp(0.0, 1.0);
        match self {
            Easing::InSine => -distance * (t * FRAC_PI_2).cos() + distance + start,
            Easing::OutSine => distance * (t * FRAC_PI_2).sin() + start,
            Easing::InQuadratic => distance * t * t + start,
            Easing::OutQuadratic => -distance * t * (t - 2.0) + start,
            Easing::Linear => distance * t + start,
        }
    }
}

impl std::fmt::Display for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Easing::InSine => "in-sine",
            Easing::OutSine => "out-sine",
            Easing::InQuadratic => "in-quadratic",
            Easing::OutQuadratic => "out-quadratic",
            Easing::Linear => "linear",
        };
        f.write_str(name)
    }
}
