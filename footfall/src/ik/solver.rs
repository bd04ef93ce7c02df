use log::{debug, error, trace};

use crate::{
    bitmask_flags::BitmaskFlags,
    error::{ConfigResult, check_range},
    math::{Vec3, move_towards, rotate_towards},
    pose::PoseTargets,
    probe::GroundQuery,
    proportion::Calibration,
    skeleton::{BipedBinding, Skeleton},
};

use super::{
    foot::{FootSlot, FootState},
    settings::IkSettings,
    weight::{GroundWeight, velocity_factor},
};

/// Feet are processed in this order each tick.
const SOLVE_ORDER: [FootSlot; 2] = [FootSlot::Left, FootSlot::Right];

/// Foot and pelvis ground adaptation for one biped.
///
/// The host calls the three phases every frame, in order:
/// 1. [`on_fixed_step`](Self::on_fixed_step): root velocity and ground weight.
/// 2. [`on_late_step`](Self::on_late_step): one ground probe per enabled foot.
/// 3. [`on_pose_resolve`](Self::on_pose_resolve): pelvis and foot goals.
///
/// Construction is the only fallible step; a solver that exists is bound to a biped.
#[derive(Clone, Debug)]
pub struct GroundAdaptiveIk {
    settings: IkSettings,
    binding: BipedBinding,
    enabled: BitmaskFlags<u8>,
    feet: [FootState; 2],
    weight: GroundWeight,
    offset: f32,
    probe_radius: f32,
    pelvis_height: f32,
    last_root: Vec3,
    velocity: f32,
}

impl GroundAdaptiveIk {
    /// Bind both feet of `skeleton`. Both feet start enabled and airborne.
    pub fn new<S: Skeleton + ?Sized>(skeleton: &S, settings: IkSettings) -> ConfigResult<Self> {
        settings.validate()?;
        let binding = BipedBinding::bind(skeleton).inspect_err(|e| {
            error!("ground ik binding failed: {e}");
        })?;

        let mut enabled = BitmaskFlags::default();
        enabled.add_many(&FootSlot::ALL);

        Ok(Self {
            settings,
            binding,
            enabled,
            feet: [FootState::default(); 2],
            weight: GroundWeight::default(),
            offset: 0.0,
            probe_radius: settings.radius,
            pelvis_height: 0.0,
            last_root: skeleton.root().translation,
            velocity: 1.0,
        })
    }

    pub fn settings(&self) -> &IkSettings {
        &self.settings
    }

    /// Replace the tuning. Rejected settings leave the current ones in place.
    ///
    /// The calibrated offset and probe radius are kept; `settings.radius` only seeds the
    /// radius at construction.
    pub fn set_settings(&mut self, settings: IkSettings) -> ConfigResult<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Takes effect from the next phase call.
    pub fn set_enabled(&mut self, slot: FootSlot, on: bool) {
        self.enabled.set(slot, on);
    }

    pub fn is_enabled(&self, slot: FootSlot) -> bool {
        self.enabled.has(slot)
    }

    /// Push the offset and probe radius produced by a proportion change.
    pub fn calibrate(&mut self, calibration: Calibration) -> ConfigResult<()> {
        check_range("offset", calibration.offset, (f32::MIN, f32::MAX))?;
        check_range(
            "probe_radius",
            calibration.probe_radius,
            (f32::MIN_POSITIVE, f32::MAX),
        )?;
        self.offset = calibration.offset;
        self.probe_radius = calibration.probe_radius;
        debug!(
            "ground ik calibrated: offset={:.4} radius={:.4}",
            self.offset, self.probe_radius
        );
        Ok(())
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Probe sphere radius in use.
    pub fn probe_radius(&self) -> f32 {
        self.probe_radius
    }

    /// Current ground weight in `[0, 1]`.
    pub fn weight(&self) -> f32 {
        self.weight.value()
    }

    pub fn foot(&self, slot: FootSlot) -> &FootState {
        &self.feet[slot.index()]
    }

    /// Whether either foot touched ground on the last probe.
    pub fn on_ground(&self) -> bool {
        self.feet.iter().any(|f| f.on_ground)
    }

    /// Smoothed pelvis correction, before the calibration offset.
    pub fn pelvis_height(&self) -> f32 {
        self.pelvis_height
    }

    /// Velocity factor measured on the last fixed step (at least 1).
    pub fn velocity_factor(&self) -> f32 {
        self.velocity
    }

    /// Fixed-rate phase: measure root velocity and move the weight toward the ground state.
    pub fn on_fixed_step<S: Skeleton + ?Sized>(&mut self, skeleton: &S, dt: f32) {
        let root = skeleton.root().translation;
        self.velocity = velocity_factor(&self.last_root, &root, dt);
        self.last_root = root;

        let grounded = self.on_ground();
        self.weight.step(grounded, &self.settings, self.velocity, dt);
    }

    /// Late phase: probe the ground under every enabled foot.
    pub fn on_late_step<S, G>(&mut self, skeleton: &S, ground: &G)
    where
        S: Skeleton + ?Sized,
        G: GroundQuery + ?Sized,
    {
        for slot in SOLVE_ORDER {
            self.probe_foot(skeleton, ground, slot);
        }
    }

    /// Probe under one foot and update its state. Returns whether the foot is grounded.
    ///
    /// The probe starts `probe_height` above the root, straight above the animated foot,
    /// and reaches `2 * probe_height` down. `probe_height` is `max_height` while the other
    /// foot is grounded and `min_height` otherwise. Disabled feet are left untouched.
    fn probe_foot<S, G>(&mut self, skeleton: &S, ground: &G, slot: FootSlot) -> bool
    where
        S: Skeleton + ?Sized,
        G: GroundQuery + ?Sized,
    {
        if !self.enabled.has(slot) {
            return self.feet[slot.index()].on_ground;
        }
        let Some(foot) = skeleton.bone_position(self.binding.handle(slot.bone())) else {
            return self.feet[slot.index()].on_ground;
        };
        let root_y = skeleton.root().translation.y;

        let probe_height = if self.feet[slot.other().index()].on_ground {
            self.settings.max_height
        } else {
            self.settings.min_height
        };

        let mut origin = foot;
        origin.y = root_y + probe_height;
        let hit = ground.sphere_cast(
            origin,
            self.probe_radius,
            -Vec3::y_axis(),
            probe_height * 2.0,
            self.settings.collision_mask,
        );

        let state = &mut self.feet[slot.index()];
        if state.apply_probe(hit, root_y, probe_height) {
            trace!(
                "{slot:?} foot {}",
                if state.on_ground { "grounded" } else { "airborne" }
            );
        }
        state.on_ground
    }

    /// Pose phase: lift or drop the pelvis (both feet enabled only), then place each
    /// enabled foot.
    pub fn on_pose_resolve<S, P>(&mut self, skeleton: &S, pose: &mut P, dt: f32)
    where
        S: Skeleton + ?Sized,
        P: PoseTargets + ?Sized,
    {
        if self.enabled.has_all(&FootSlot::ALL) {
            self.offset_pelvis(skeleton, pose, dt);
        }
        for slot in SOLVE_ORDER {
            if self.enabled.has(slot) {
                self.place_foot(skeleton, pose, slot, dt);
            }
        }
    }

    fn offset_pelvis<S, P>(&mut self, skeleton: &S, pose: &mut P, dt: f32)
    where
        S: Skeleton + ?Sized,
        P: PoseTargets + ?Sized,
    {
        let root_y = skeleton.root().translation.y;
        let lowest = self
            .feet
            .iter()
            .map(|f| f.target_pos.y - root_y)
            .fold(f32::INFINITY, f32::min);

        let height = lowest * self.settings.offset_speed * self.weight.value();
        let rate = if height < self.pelvis_height {
            self.settings.pelvis_speed * self.settings.fall_modifier
        } else {
            self.settings.pelvis_speed
        };
        self.pelvis_height = move_towards(self.pelvis_height, height, rate * dt.max(0.0));

        let mut body = pose.body_position();
        body.y += self.pelvis_height + self.offset;
        pose.set_body_position(body);
    }

    fn place_foot<S, P>(&mut self, skeleton: &S, pose: &mut P, slot: FootSlot, dt: f32)
    where
        S: Skeleton + ?Sized,
        P: PoseTargets + ?Sized,
    {
        let root = skeleton.root();
        let dt = dt.max(0.0);
        let state = &mut self.feet[slot.index()];

        // Height: smoothed in root space so a tilted or scaled root stays consistent.
        let mut local = root.inverse_transform_point(&pose.goal_position(slot));
        let ground = root.inverse_transform_point(&state.target_pos);
        state.last_height = move_towards(
            state.last_height,
            ground.y,
            self.settings.adapt_speed * dt,
        );
        local.y += state.last_height;
        let position = root.transform_point(&local) + state.target_normal * self.offset;

        // Rotation: converge on the surface tilt expressed relative to the animation.
        let animated = pose.goal_rotation(slot);
        let relative = (state.target_rot * animated).inverse() * animated;
        state.last_rot = rotate_towards(
            state.last_rot,
            relative.inverse(),
            self.settings.adapt_rotation.to_radians() * dt,
        );
        let rotation = animated * state.last_rot;

        let weight = self.weight.value();
        pose.set_goal_position(slot, position);
        pose.set_goal_position_weight(slot, weight);
        pose.set_goal_rotation(slot, rotation);
        pose.set_goal_rotation_weight(slot, weight);
    }
}
