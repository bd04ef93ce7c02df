/*!
Default tuning values and documented slider ranges.

Keeping these together makes tuning easier and keeps the ranges that
`ProportionParams::validate` and `IkSettings::validate` enforce in one place.

Notes
- Distances are in meters, time in seconds, angles in degrees unless stated.
- Ranges are inclusive `(min, max)` pairs.
*/

/// Probe height above the root used while the other foot is grounded (meters).
pub const DEFAULT_MAX_HEIGHT: f32 = 0.5;

/// Probe height above the root used while the other foot is airborne (meters).
/// Lower than `DEFAULT_MAX_HEIGHT` so a swinging foot can reach further down.
pub const DEFAULT_MIN_HEIGHT: f32 = 0.25;

/// Foot probe sphere radius before any proportion scaling (meters).
pub const DEFAULT_PROBE_RADIUS: f32 = 0.05;

/// Multiplier on the pelvis correction.
pub const DEFAULT_OFFSET_SPEED: f32 = 0.75;

/// Rate at which the ground weight and foot height converge (per second).
pub const DEFAULT_ADAPT_SPEED: f32 = 1.0;

/// Maximum foot tilt change (degrees per second).
pub const DEFAULT_ADAPT_ROTATION: f32 = 90.0;

/// Multiplier applied to descending rates (weight fading out, pelvis dropping).
pub const DEFAULT_FALL_MODIFIER: f32 = 1.0;

/// Rate used while the ground weight decreases in the asymmetric variant (per second).
pub const DEFAULT_FALL_RATE: f32 = 10.0;

/// Bounded rate of the pelvis height smoothing (meters per second).
pub const DEFAULT_PELVIS_SPEED: f32 = 1.0;

/// Default collision mask (first group only).
pub const DEFAULT_COLLISION_MASK: u32 = 1;

/// Lower clamp for the measured root speed used by velocity-scaled adaptation.
pub const MIN_VELOCITY_SCALE: f32 = 1.0;

pub const OFFSET_SPEED_RANGE: (f32, f32) = (0.1, 5.0);
pub const ADAPT_SPEED_RANGE: (f32, f32) = (0.1, 5.0);
pub const ADAPT_ROTATION_RANGE: (f32, f32) = (0.0, 360.0);

/// Range of most proportion sliders.
pub const PROPORTION_RANGE: (f32, f32) = (0.5, 1.5);
pub const SHOULDERS_RANGE: (f32, f32) = (0.5, 2.0);
pub const FINGERS_RANGE: (f32, f32) = (0.5, 2.5);
pub const LEGS_RANGE: (f32, f32) = (0.8, 1.2);
pub const FEET_RADIUS_RANGE: (f32, f32) = (0.01, 0.5);

/// Leg slider interval used for the long-leg offset correction.
pub const LONG_LEG_SPAN: (f32, f32) = (1.0, 1.2);
/// Leg slider interval (inverted) used for the short-leg offset correction.
pub const SHORT_LEG_SPAN: (f32, f32) = (1.0, 0.8);
/// Offset applied at the long end of the leg slider (meters).
pub const LONG_LEG_OFFSET: f32 = -0.01;
/// Offset applied at the short end of the leg slider (meters).
pub const SHORT_LEG_OFFSET: f32 = 0.03;

/// Floor for scale factors built by addition (`overall`, `upper_body`).
/// At the bottom of their slider ranges those sums reach zero or below.
pub const MIN_SEGMENT_SCALE: f32 = 0.1;

/// Practical small distance for comparisons (meters).
pub const DIST_EPS: f32 = 1.0e-6;
