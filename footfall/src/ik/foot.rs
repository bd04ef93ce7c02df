use crate::{
    math::{Point3, Quat, Vec3, tilt_from_normal},
    probe::ProbeHit,
    skeleton::HumanBone,
};

crate::define_bitmask_flags!(
    /// Foot goal slots. The discriminant doubles as the slot index.
    FootSlot, u8, {
        Right,
        Left,
    }
);

impl FootSlot {
    pub const ALL: [FootSlot; 2] = [FootSlot::Right, FootSlot::Left];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn other(self) -> Self {
        match self {
            FootSlot::Right => FootSlot::Left,
            FootSlot::Left => FootSlot::Right,
        }
    }

    pub fn bone(self) -> HumanBone {
        match self {
            FootSlot::Right => HumanBone::RightFoot,
            FootSlot::Left => HumanBone::LeftFoot,
        }
    }
}

/// Per-foot probe result and smoothing state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FootState {
    pub on_ground: bool,
    /// Ground contact (or the probe floor while airborne), world space.
    pub target_pos: Point3,
    /// Last surface normal seen. Zero until the first hit.
    pub target_normal: Vec3,
    /// Surface tilt. Identity while airborne.
    pub target_rot: Quat,
    /// Smoothed ground height in root space.
    pub last_height: f32,
    /// Smoothed tilt correction.
    pub last_rot: Quat,
}

impl Default for FootState {
    fn default() -> Self {
        Self {
            on_ground: false,
            target_pos: Point3::origin(),
            target_normal: Vec3::zeros(),
            target_rot: Quat::identity(),
            last_height: 0.0,
            last_rot: Quat::identity(),
        }
    }
}

impl FootState {
    /// Fold one probe into the state. Returns `true` when `on_ground` changed.
    ///
    /// A miss keeps the previous target; either way an airborne foot is pinned to the
    /// probe floor `root_y - probe_height` with no tilt.
    pub fn apply_probe(&mut self, hit: Option<ProbeHit>, root_y: f32, probe_height: f32) -> bool {
        let mut depth = probe_height;
        if let Some(hit) = hit {
            depth = root_y - hit.point.y;
            self.target_pos = hit.point;
            self.target_normal = hit.normal;
            self.target_rot = tilt_from_normal(&hit.normal);
        }

        let was = self.on_ground;
        self.on_ground = depth < probe_height;
        if !self.on_ground {
            self.target_pos.y = root_y - probe_height;
            self.target_rot = Quat::identity();
        }
        was != self.on_ground
    }
}
