//! Rapier-based ground world for foot probing.
//!
//! Hosts that do not run their own physics can describe the walkable static geometry as a
//! list of [`GroundStaticDef`]s, build a [`GroundQueryWorld`] once, and hand it to the
//! solver as its [`GroundQuery`].
//!
//! Design goals
//! - Deterministic: given the same inputs (sorted by `id`), build identical in-memory sets.
//! - Query-focused: only scene queries run; nothing is simulated.
//! - Immutable world: statics do not move after construction. Rebuild to change the scene.

// Re-export Rapier so hosts can build shapes without depending on `rapier3d` directly.
pub use rapier3d;

use rapier3d::{
    na::{Isometry3, Translation3, UnitQuaternion, UnitVector3},
    parry::query::ShapeCastOptions,
    prelude::*,
};

use crate::{
    constants::DIST_EPS,
    math::{Point3, Vec3},
    probe::{GroundQuery, ProbeHit},
};

/// Definition of one immutable ground collider.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - For planes, the normal is pose-derived: `normal = rotation * +Y`,
///   and `dist = dot(normal, translation) + offset_along_normal`.
#[derive(Clone, Debug)]
pub struct GroundStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    /// World-space translation.
    pub translation: Vec3,
    /// World-space rotation.
    pub rotation: UnitQuaternion<f32>,
    /// Collision groups this collider belongs to (matched against the probe mask).
    pub groups: u32,
    pub shape: GroundShapeDef,
}

impl GroundStaticDef {
    /// Axis-aligned ground in group 1.
    pub fn new(id: u32, translation: Vec3, shape: GroundShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation: UnitQuaternion::identity(),
            groups: 1,
            shape,
        }
    }

    pub fn rotated(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn in_groups(mut self, groups: u32) -> Self {
        self.groups = groups;
        self
    }

    /// World pose of the collider. Planes are shifted along their normal by the offset.
    pub fn pose(&self) -> Isometry3<f32> {
        let translation = match &self.shape {
            GroundShapeDef::Plane {
                offset_along_normal,
            } => self.translation + self.rotation * (Vec3::y() * *offset_along_normal),
            _ => self.translation,
        };
        Isometry3::from_parts(Translation3::from(translation), self.rotation)
    }
}

/// Supported static ground shapes.
#[derive(Clone, Debug)]
pub enum GroundShapeDef {
    /// Infinite plane (half-space), normal derived from the pose.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters). Steps, ramps, crates.
    Cuboid { half_extents: Vec3 },

    /// Ball (meters). Boulders and dropped props.
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },
}

/// Static Rapier scene answering foot probes.
pub struct GroundQueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
}

impl GroundQueryWorld {
    /// Build a query world from ground definitions.
    ///
    /// Determinism
    /// - The input is sorted by `id` before insertion.
    /// - Any NaN/invalid values should be filtered/validated by the caller.
    pub fn build(mut defs: Vec<GroundStaticDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut modified_colliders = Vec::with_capacity(defs.len());

        for def in &defs {
            let mut collider = collider_from_def(def);
            collider.set_position(def.pose());
            modified_colliders.push(colliders.insert(collider));
        }

        let mut broad_phase = BroadPhaseBvh::new();
        let mut events = Vec::new();
        broad_phase.update(
            &IntegrationParameters::default(),
            &colliders,
            &bodies,
            &modified_colliders,
            &[],
            &mut events,
        );

        log::debug!("ground query world built with {} colliders", colliders.len());

        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase: NarrowPhase::default(),
        }
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Borrowed `QueryPipeline` view. Use within the scope of the borrow.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }
}

impl GroundQuery for GroundQueryWorld {
    fn sphere_cast(
        &self,
        origin: Point3,
        radius: f32,
        direction: UnitVector3<f32>,
        max_distance: f32,
        mask: u32,
    ) -> Option<ProbeHit> {
        let groups = InteractionGroups::all().with_filter(Group::from_bits_truncate(mask));
        let pipeline = self.query_pipeline(QueryFilter::default().groups(groups));

        let ball = Ball::new(radius);
        let start = Isometry3::translation(origin.x, origin.y, origin.z);
        let vel = direction.into_inner();

        let mut opts = ShapeCastOptions::with_max_time_of_impact(max_distance.max(0.0));
        opts.stop_at_penetration = true;
        let (_handle, hit) = pipeline.cast_shape(&start, &vel, &ball, opts)?;

        // The cast direction is unit length, so time of impact is a distance.
        let center = origin + vel * hit.time_of_impact;

        // Contact point is the closest surface point to the ball center at impact; the
        // normal points from that surface point back to the center.
        let (_handle, proj) = pipeline.project_point(&center, radius * 2.0 + DIST_EPS, true)?;
        let to_center = center - proj.point;
        let normal = if proj.is_inside || to_center.norm_squared() <= DIST_EPS * DIST_EPS {
            -vel
        } else {
            to_center.normalize()
        };

        Some(ProbeHit {
            point: proj.point,
            normal,
            distance: hit.time_of_impact,
        })
    }
}

/// Build a Rapier collider for `def`'s shape and collision groups. The caller sets the pose.
fn collider_from_def(def: &GroundStaticDef) -> Collider {
    let groups = InteractionGroups::all().with_memberships(Group::from_bits_truncate(def.groups));
    let builder = match &def.shape {
        // Local +Y half-space; the pose rotates it so that normal = R * +Y.
        GroundShapeDef::Plane { .. } => {
            ColliderBuilder::new(SharedShape::new(HalfSpace::new(Vector::y_axis())))
        }

        GroundShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }

        GroundShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),

        GroundShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),
    };
    builder.collision_groups(groups).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down() -> UnitVector3<f32> {
        -Vec3::y_axis()
    }

    fn floor_and_step() -> GroundQueryWorld {
        GroundQueryWorld::build(vec![
            GroundStaticDef::new(
                2,
                Vec3::new(1.0, 0.1, 0.0),
                GroundShapeDef::Cuboid {
                    half_extents: Vec3::new(0.5, 0.1, 0.5),
                },
            ),
            GroundStaticDef::new(
                1,
                Vec3::zeros(),
                GroundShapeDef::Plane {
                    offset_along_normal: 0.0,
                },
            ),
        ])
    }

    #[test]
    fn probe_lands_on_floor() {
        let world = floor_and_step();
        assert_eq!(world.collider_count(), 2);

        let hit = world
            .sphere_cast(Point3::new(0.0, 0.5, 0.0), 0.05, down(), 1.0, 1)
            .expect("floor is within reach");
        assert!(hit.point.y.abs() < 1.0e-3);
        assert!((hit.normal - Vec3::y()).norm() < 1.0e-3);
        assert!((hit.distance - 0.45).abs() < 1.0e-3);
    }

    #[test]
    fn probe_lands_on_step_top() {
        let world = floor_and_step();
        let hit = world
            .sphere_cast(Point3::new(1.0, 0.5, 0.0), 0.05, down(), 1.0, 1)
            .unwrap();
        assert!((hit.point.y - 0.2).abs() < 1.0e-3);
        assert!((hit.normal - Vec3::y()).norm() < 1.0e-3);
    }

    #[test]
    fn mask_excludes_other_groups_and_short_casts_miss() {
        let world = GroundQueryWorld::build(vec![
            GroundStaticDef::new(
                1,
                Vec3::zeros(),
                GroundShapeDef::Plane {
                    offset_along_normal: 0.0,
                },
            )
            .in_groups(0b100),
        ]);
        let origin = Point3::new(0.0, 0.5, 0.0);
        assert!(world.sphere_cast(origin, 0.05, down(), 1.0, 0b001).is_none());
        assert!(world.sphere_cast(origin, 0.05, down(), 1.0, 0b100).is_some());
        assert!(world.sphere_cast(origin, 0.05, down(), 0.2, 0b100).is_none());
    }

    #[test]
    fn plane_offset_moves_along_normal() {
        let world = GroundQueryWorld::build(vec![GroundStaticDef::new(
            1,
            Vec3::zeros(),
            GroundShapeDef::Plane {
                offset_along_normal: 0.2,
            },
        )]);
        let hit = world
            .sphere_cast(Point3::new(0.0, 0.5, 0.0), 0.05, down(), 1.0, 1)
            .unwrap();
        assert!((hit.point.y - 0.2).abs() < 1.0e-3);
    }

    #[test]
    fn tilted_plane_reports_tilted_normal() {
        let tilt = UnitQuaternion::from_axis_angle(&Vec3::x_axis(), 0.3);
        let world = GroundQueryWorld::build(vec![
            GroundStaticDef::new(
                1,
                Vec3::zeros(),
                GroundShapeDef::Plane {
                    offset_along_normal: 0.0,
                },
            )
            .rotated(tilt),
        ]);
        let hit = world
            .sphere_cast(Point3::new(0.0, 0.5, 0.0), 0.05, down(), 1.0, 1)
            .unwrap();
        assert!((hit.normal - tilt * Vec3::y()).norm() < 1.0e-3);
    }
}
