/*!
Spatial query interface used for foot probing.

The solver only needs one query: sweep a sphere along a direction and report the first
surface it touches. Anything that can answer that implements [`GroundQuery`]: the Rapier
scene in [`crate::rapier_world`], the analytic planes below, or a plain closure.

Conventions
- `direction` is a unit vector; `max_distance` is in meters along it.
- `mask` selects collision groups: a surface is considered when `groups & mask != 0`.
- A sphere that starts overlapping a surface reports a hit at distance 0.
- No hit is `None`. That is the airborne case, not an error.
*/

use nalgebra::UnitVector3;

use crate::math::{Point3, Vec3};

/// First surface touched by a sphere cast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    /// World-space contact point on the surface.
    pub point: Point3,
    /// World-space surface normal at the contact (unit length).
    pub normal: Vec3,
    /// Distance travelled by the sphere center before contact.
    pub distance: f32,
}

pub trait GroundQuery {
    fn sphere_cast(
        &self,
        origin: Point3,
        radius: f32,
        direction: UnitVector3<f32>,
        max_distance: f32,
        mask: u32,
    ) -> Option<ProbeHit>;
}

impl<F> GroundQuery for F
where
    F: Fn(Point3, f32, UnitVector3<f32>, f32, u32) -> Option<ProbeHit>,
{
    fn sphere_cast(
        &self,
        origin: Point3,
        radius: f32,
        direction: UnitVector3<f32>,
        max_distance: f32,
        mask: u32,
    ) -> Option<ProbeHit> {
        self(origin, radius, direction, max_distance, mask)
    }
}

/// Infinite plane `normal ⋅ x = dist`, solid below.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneGround {
    pub normal: UnitVector3<f32>,
    pub dist: f32,
    /// Collision groups this surface belongs to.
    pub groups: u32,
}

impl PlaneGround {
    /// Horizontal ground at `height`, in group 1.
    pub fn flat(height: f32) -> Self {
        Self {
            normal: Vec3::y_axis(),
            dist: height,
            groups: 1,
        }
    }

    /// Plane through `point` with the given `normal`, in group 1.
    pub fn through(point: Point3, normal: Vec3) -> Self {
        let normal = UnitVector3::new_normalize(normal);
        Self {
            dist: normal.dot(&point.coords),
            normal,
            groups: 1,
        }
    }

    pub fn with_groups(mut self, groups: u32) -> Self {
        self.groups = groups;
        self
    }

    /// Height of the plane above `(x, z)`, if it is not vertical.
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let n = self.normal.into_inner();
        if n.y.abs() <= f32::EPSILON {
            return None;
        }
        Some((self.dist - n.x * x - n.z * z) / n.y)
    }
}

impl GroundQuery for PlaneGround {
    fn sphere_cast(
        &self,
        origin: Point3,
        radius: f32,
        direction: UnitVector3<f32>,
        max_distance: f32,
        mask: u32,
    ) -> Option<ProbeHit> {
        if self.groups & mask == 0 {
            return None;
        }

        let n = self.normal.into_inner();
        let separation = n.dot(&origin.coords) - self.dist;
        if separation < radius {
            // Already touching: contact is the closest point on the plane.
            return Some(ProbeHit {
                point: origin - n * separation,
                normal: n,
                distance: 0.0,
            });
        }

        let approach = -n.dot(&direction.into_inner());
        if approach <= f32::EPSILON {
            return None;
        }
        let distance = (separation - radius) / approach;
        if distance > max_distance {
            return None;
        }

        let center = origin + direction.into_inner() * distance;
        Some(ProbeHit {
            point: center - n * radius,
            normal: n,
            distance,
        })
    }
}

/// Several planes; the nearest hit wins.
#[derive(Clone, Debug, Default)]
pub struct PlaneSet {
    pub planes: Vec<PlaneGround>,
}

impl PlaneSet {
    pub fn new(planes: Vec<PlaneGround>) -> Self {
        Self { planes }
    }
}

impl GroundQuery for PlaneSet {
    fn sphere_cast(
        &self,
        origin: Point3,
        radius: f32,
        direction: UnitVector3<f32>,
        max_distance: f32,
        mask: u32,
    ) -> Option<ProbeHit> {
        let mut best: Option<ProbeHit> = None;
        for plane in &self.planes {
            if let Some(hit) = plane.sphere_cast(origin, radius, direction, max_distance, mask) {
                if best.as_ref().map_or(true, |b| hit.distance < b.distance) {
                    best = Some(hit);
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down() -> UnitVector3<f32> {
        -Vec3::y_axis()
    }

    #[test]
    fn flat_ground_hit_reports_contact_point() {
        let ground = PlaneGround::flat(0.0);
        let hit = ground
            .sphere_cast(Point3::new(0.3, 0.5, -0.2), 0.05, down(), 1.0, 1)
            .expect("ground is within reach");
        assert!((hit.distance - 0.45).abs() < 1.0e-5);
        assert!((hit.point - Point3::new(0.3, 0.0, -0.2)).norm() < 1.0e-5);
        assert!((hit.normal - Vec3::y()).norm() < 1.0e-6);
    }

    #[test]
    fn out_of_reach_and_masked_surfaces_miss() {
        let ground = PlaneGround::flat(-2.0);
        assert!(ground.sphere_cast(Point3::origin(), 0.05, down(), 1.0, 1).is_none());

        let layer = PlaneGround::flat(0.0).with_groups(0b10);
        let origin = Point3::new(0.0, 0.5, 0.0);
        assert!(layer.sphere_cast(origin, 0.05, down(), 1.0, 0b01).is_none());
        assert!(layer.sphere_cast(origin, 0.05, down(), 1.0, 0b10).is_some());
    }

    #[test]
    fn sloped_ground_contact_lies_on_plane() {
        let normal = Vec3::new(0.0, 1.0, 0.3).normalize();
        let ground = PlaneGround::through(Point3::origin(), normal);
        let hit = ground
            .sphere_cast(Point3::new(0.0, 1.0, 1.0), 0.05, down(), 3.0, 1)
            .unwrap();
        assert!(ground.normal.dot(&hit.point.coords).abs() < 1.0e-4);
        assert!((hit.normal - normal).norm() < 1.0e-5);
        let expected = ground.height_at(hit.point.x, hit.point.z).unwrap();
        assert!((hit.point.y - expected).abs() < 1.0e-4);
    }

    #[test]
    fn overlapping_start_hits_at_zero() {
        let ground = PlaneGround::flat(0.0);
        let hit = ground
            .sphere_cast(Point3::new(0.0, 0.01, 0.0), 0.05, down(), 1.0, 1)
            .unwrap();
        assert_eq!(hit.distance, 0.0);
        assert!(hit.point.y.abs() < 1.0e-6);
    }

    #[test]
    fn plane_set_returns_nearest_and_closures_work() {
        let set = PlaneSet::new(vec![PlaneGround::flat(-0.3), PlaneGround::flat(0.1)]);
        let hit = set
            .sphere_cast(Point3::new(0.0, 0.5, 0.0), 0.05, down(), 2.0, 1)
            .unwrap();
        assert!((hit.point.y - 0.1).abs() < 1.0e-5);

        let never = |_: Point3, _: f32, _: UnitVector3<f32>, _: f32, _: u32| -> Option<ProbeHit> {
            None
        };
        assert!(never.sphere_cast(Point3::origin(), 0.1, down(), 1.0, 1).is_none());
    }
}
