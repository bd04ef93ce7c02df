use crate::{
    constants::MIN_VELOCITY_SCALE,
    math::{Vec3, move_towards},
};

use super::settings::IkSettings;

/// Ground confidence in `[0, 1]`, shared by both feet and the pelvis.
///
/// Only ever moves toward 0 or 1 at a bounded rate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GroundWeight {
    value: f32,
}

impl GroundWeight {
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Advance one fixed tick toward 1 when `grounded`, toward 0 otherwise.
    ///
    /// `velocity_factor` only applies when the settings ask for velocity scaling.
    pub fn step(
        &mut self,
        grounded: bool,
        settings: &IkSettings,
        velocity_factor: f32,
        dt: f32,
    ) -> f32 {
        let target = if grounded { 1.0 } else { 0.0 };
        let rate = if self.value < target {
            settings.adapt_speed
        } else {
            settings.descend_rate()
        };
        let scale = if settings.velocity_scaled {
            velocity_factor
        } else {
            1.0
        };
        self.value = move_towards(self.value, target, rate * scale * dt.max(0.0));
        self.value
    }
}

/// Root speed over the last fixed tick, clamped below at 1.
#[inline]
pub fn velocity_factor(last: &Vec3, current: &Vec3, dt: f32) -> f32 {
    if dt <= 0.0 {
        return MIN_VELOCITY_SCALE;
    }
    ((last - current) / dt).norm().max(MIN_VELOCITY_SCALE)
}
