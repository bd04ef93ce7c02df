/*!
Math aliases and the small interpolation helpers shared by the scaler and the solver.

This module intentionally contains no solver state. Everything here is a pure function
over nalgebra types so each step of the foot/pelvis smoothing can be tested on its own.
*/

use nalgebra as na;

use crate::constants::DIST_EPS;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Quat = na::UnitQuaternion<f32>;

/// World up (+Y).
#[inline]
pub fn up() -> Vec3 {
    Vec3::y()
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta.max(0.0) {
        target
    } else {
        current + delta.signum() * max_delta.max(0.0)
    }
}

/// Rotate `from` toward `to` by at most `max_radians`, along the shortest arc.
///
/// Returns `to` exactly once it is within reach.
#[inline]
pub fn rotate_towards(from: Quat, to: Quat, max_radians: f32) -> Quat {
    let delta = to * from.inverse();
    let angle = delta.angle();
    let max = max_radians.max(0.0);
    if angle <= max || angle <= DIST_EPS {
        return to;
    }
    let step = Quat::from_scaled_axis(delta.scaled_axis() * (max / angle));
    step * from
}

/// Where `value` sits between `a` and `b`, clamped to `[0, 1]`.
///
/// `a > b` is allowed and inverts the interval. A degenerate interval returns 0.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Rotation mapping world up onto `normal`.
///
/// Axis is `up × normal`, angle is the angle between them. Parallel (or degenerate)
/// normals produce identity.
#[inline]
pub fn tilt_from_normal(normal: &Vec3) -> Quat {
    if normal.norm_squared() <= DIST_EPS * DIST_EPS {
        return Quat::identity();
    }
    Quat::rotation_between(&up(), normal).unwrap_or_else(Quat::identity)
}

/// Character root pose: translation, rotation and per-axis local scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for RootTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
        }
    }
}

impl RootTransform {
    /// Local-space point to world space (scale, then rotate, then translate).
    #[inline]
    pub fn transform_point(&self, local: &Point3) -> Point3 {
        let scaled = local.coords.component_mul(&self.scale);
        Point3::from(self.rotation * scaled + self.translation)
    }

    /// World-space point to local space. Zero scale axes map to zero.
    #[inline]
    pub fn inverse_transform_point(&self, world: &Point3) -> Point3 {
        let unrotated = self.rotation.inverse() * (world.coords - self.translation);
        let inv_scale = self.scale.map(|s| if s.abs() > DIST_EPS { 1.0 / s } else { 0.0 });
        Point3::from(unrotated.component_mul(&inv_scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn move_towards_clamps_and_never_overshoots() {
        assert_eq!(move_towards(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_towards(0.9, 1.0, 0.25), 1.0);
        assert_eq!(move_towards(1.0, 0.0, 0.5), 0.5);
        // Negative rates are treated as zero.
        assert_eq!(move_towards(0.3, 1.0, -1.0), 0.3);
    }

    #[test]
    fn rotate_towards_limits_angle_per_step() {
        let from = Quat::identity();
        let to = Quat::from_axis_angle(&Vec3::x_axis(), FRAC_PI_2);

        let step = rotate_towards(from, to, 0.1);
        assert!((step.angle_to(&from) - 0.1).abs() < 1.0e-5);
        assert!((step.angle_to(&to) - (FRAC_PI_2 - 0.1)).abs() < 1.0e-5);

        let done = rotate_towards(from, to, 2.0);
        assert!(done.angle_to(&to) < 1.0e-6);
    }

    #[test]
    fn inverse_lerp_handles_inverted_interval() {
        assert!((inverse_lerp(1.0, 1.2, 1.1) - 0.5).abs() < 1.0e-5);
        assert!((inverse_lerp(1.0, 0.8, 0.9) - 0.5).abs() < 1.0e-5);
        assert_eq!(inverse_lerp(1.0, 0.8, 1.0), 0.0);
        assert_eq!(inverse_lerp(1.0, 1.2, 2.0), 1.0);
        assert_eq!(inverse_lerp(1.0, 1.0, 5.0), 0.0);
    }

    #[test]
    fn tilt_maps_up_onto_normal() {
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let tilt = tilt_from_normal(&normal);
        assert!((tilt * up() - normal).norm() < 1.0e-5);

        assert_eq!(tilt_from_normal(&up()), Quat::identity());
        assert_eq!(tilt_from_normal(&Vec3::zeros()), Quat::identity());
    }

    #[test]
    fn root_transform_points_invert() {
        let root = RootTransform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            scale: Vec3::repeat(1.5),
        };
        let p = Point3::new(0.2, -0.4, 0.9);
        let back = root.inverse_transform_point(&root.transform_point(&p));
        assert!((back - p).norm() < 1.0e-5);
    }
}
