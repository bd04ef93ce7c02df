/*!
Ground IK tuning.

One configuration covers every solver variant: the option flags select velocity-scaled
adaptation and asymmetric rise/fall rates.

Notes
- Heights and radius are in meters, rates per second, `adapt_rotation` in degrees per second.
- `radius` is overwritten by each calibration pushed from the proportion scaler.
*/

use log::warn;

use crate::{
    constants::{
        ADAPT_ROTATION_RANGE, ADAPT_SPEED_RANGE, DEFAULT_ADAPT_ROTATION, DEFAULT_ADAPT_SPEED,
        DEFAULT_COLLISION_MASK, DEFAULT_FALL_MODIFIER, DEFAULT_FALL_RATE, DEFAULT_MAX_HEIGHT,
        DEFAULT_MIN_HEIGHT, DEFAULT_OFFSET_SPEED, DEFAULT_PELVIS_SPEED, DEFAULT_PROBE_RADIUS,
        OFFSET_SPEED_RANGE,
    },
    error::{ConfigResult, ConfigurationError, check_range},
};

const POSITIVE: (f32, f32) = (f32::MIN_POSITIVE, f32::MAX);
const NON_NEGATIVE: (f32, f32) = (0.0, f32::MAX);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IkSettings {
    /// Probe height above the root while the other foot is grounded.
    pub max_height: f32,
    /// Probe height above the root while the other foot is airborne.
    pub min_height: f32,
    /// Probe sphere radius.
    pub radius: f32,
    /// Multiplier on the pelvis correction.
    pub offset_speed: f32,
    /// Rate of the weight rise and of the foot height smoothing.
    pub adapt_speed: f32,
    /// Foot tilt smoothing limit (degrees per second).
    pub adapt_rotation: f32,
    /// Multiplier on descending rates.
    pub fall_modifier: f32,
    /// Collision groups probed.
    pub collision_mask: u32,
    /// Multiply weight rates by `max(1, |root velocity|)`.
    pub velocity_scaled: bool,
    /// Rate used while the weight decreases. `None` falls at `adapt_speed`.
    pub fall_rate: Option<f32>,
    /// Bounded rate of the pelvis smoothing (meters per second).
    pub pelvis_speed: f32,
}

impl Default for IkSettings {
    /// Velocity-scaled, asymmetric variant.
    fn default() -> Self {
        Self {
            max_height: DEFAULT_MAX_HEIGHT,
            min_height: DEFAULT_MIN_HEIGHT,
            radius: DEFAULT_PROBE_RADIUS,
            offset_speed: DEFAULT_OFFSET_SPEED,
            adapt_speed: DEFAULT_ADAPT_SPEED,
            adapt_rotation: DEFAULT_ADAPT_ROTATION,
            fall_modifier: DEFAULT_FALL_MODIFIER,
            collision_mask: DEFAULT_COLLISION_MASK,
            velocity_scaled: true,
            fall_rate: Some(DEFAULT_FALL_RATE),
            pelvis_speed: DEFAULT_PELVIS_SPEED,
        }
    }
}

impl IkSettings {
    /// Same rate up and down, no velocity scaling.
    pub fn symmetric() -> Self {
        Self {
            velocity_scaled: false,
            fall_rate: None,
            ..Self::default()
        }
    }

    /// Rate at which the weight decreases, before velocity scaling.
    #[inline]
    pub fn descend_rate(&self) -> f32 {
        self.fall_rate.unwrap_or(self.adapt_speed) * self.fall_modifier
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.check().inspect_err(|e| warn!("ik settings rejected: {e}"))
    }

    fn check(&self) -> ConfigResult<()> {
        check_range("max_height", self.max_height, POSITIVE)?;
        check_range("min_height", self.min_height, (f32::MIN_POSITIVE, self.max_height))?;
        check_range("radius", self.radius, POSITIVE)?;
        check_range("offset_speed", self.offset_speed, OFFSET_SPEED_RANGE)?;
        check_range("adapt_speed", self.adapt_speed, ADAPT_SPEED_RANGE)?;
        check_range("adapt_rotation", self.adapt_rotation, ADAPT_ROTATION_RANGE)?;
        check_range("fall_modifier", self.fall_modifier, NON_NEGATIVE)?;
        check_range("pelvis_speed", self.pelvis_speed, NON_NEGATIVE)?;
        if let Some(rate) = self.fall_rate {
            check_range("fall_rate", rate, POSITIVE)?;
        }
        if self.collision_mask == 0 {
            return Err(ConfigurationError::OutOfRange {
                name: "collision_mask",
                value: 0.0,
                min: 1.0,
                max: u32::MAX as f32,
            });
        }
        Ok(())
    }
}
