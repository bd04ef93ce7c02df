//! Skeleton binding.
//!
//! The solver and the scaler never own a rig. They resolve the bones they need once,
//! through the [`Skeleton`] trait, into a [`BipedBinding`] (a fixed `HumanBone -> BoneHandle`
//! table) and then address the rig through those handles on every call.
//!
//! # Model
//! - `HumanBone` is the canonical humanoid bone set (numeric values are table indices).
//! - `BoneHandle` is an opaque per-rig identifier.
//! - A rig that does not report itself as humanoid fails binding with
//!   [`ConfigurationError::NotBiped`].
//!
//! [`HumanoidRig`] is a flat in-memory rig storing evaluated world positions and local scales;
//! hierarchy evaluation stays with the host animation system.

use crate::{
    error::{ConfigResult, ConfigurationError},
    math::{Point3, RootTransform, Vec3},
};

/// Canonical humanoid bones.
///
/// The numeric values are indices into [`BipedBinding`]'s table. Do not reorder without
/// updating [`HumanBone::ALL`].
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HumanBone {
    Hips,
    Spine,
    Chest,
    UpperChest,
    Neck,
    Head,
    LeftShoulder,
    RightShoulder,
    LeftUpperArm,
    RightUpperArm,
    LeftLowerArm,
    RightLowerArm,
    LeftHand,
    RightHand,
    LeftThumbProximal,
    LeftIndexProximal,
    LeftMiddleProximal,
    LeftRingProximal,
    LeftLittleProximal,
    RightThumbProximal,
    RightIndexProximal,
    RightMiddleProximal,
    RightRingProximal,
    RightLittleProximal,
    LeftUpperLeg,
    RightUpperLeg,
    LeftLowerLeg,
    RightLowerLeg,
    LeftFoot,
    RightFoot,
}

impl HumanBone {
    pub const COUNT: usize = 30;

    pub const ALL: [HumanBone; Self::COUNT] = [
        HumanBone::Hips,
        HumanBone::Spine,
        HumanBone::Chest,
        HumanBone::UpperChest,
        HumanBone::Neck,
        HumanBone::Head,
        HumanBone::LeftShoulder,
        HumanBone::RightShoulder,
        HumanBone::LeftUpperArm,
        HumanBone::RightUpperArm,
        HumanBone::LeftLowerArm,
        HumanBone::RightLowerArm,
        HumanBone::LeftHand,
        HumanBone::RightHand,
        HumanBone::LeftThumbProximal,
        HumanBone::LeftIndexProximal,
        HumanBone::LeftMiddleProximal,
        HumanBone::LeftRingProximal,
        HumanBone::LeftLittleProximal,
        HumanBone::RightThumbProximal,
        HumanBone::RightIndexProximal,
        HumanBone::RightMiddleProximal,
        HumanBone::RightRingProximal,
        HumanBone::RightLittleProximal,
        HumanBone::LeftUpperLeg,
        HumanBone::RightUpperLeg,
        HumanBone::LeftLowerLeg,
        HumanBone::RightLowerLeg,
        HumanBone::LeftFoot,
        HumanBone::RightFoot,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Opaque per-rig bone identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoneHandle(pub u32);

/// Skeleton binding interface consumed by the scaler and the solver.
///
/// Positions are world space and reflect the current (animated) pose. Scales are local.
pub trait Skeleton {
    /// Whether the rig reports a humanoid biped topology.
    fn is_humanoid(&self) -> bool;

    /// Resolve a canonical bone to this rig's handle.
    fn resolve(&self, bone: HumanBone) -> Option<BoneHandle>;

    /// Whether `handle` addresses a bone of this rig.
    fn contains(&self, handle: BoneHandle) -> bool;

    fn root(&self) -> RootTransform;

    fn set_root_scale(&mut self, scale: Vec3);

    fn bone_position(&self, handle: BoneHandle) -> Option<Point3>;

    fn set_bone_scale(&mut self, handle: BoneHandle, scale: Vec3);
}

/// Resolve one bone, requiring a humanoid rig.
pub fn bind_bone<S: Skeleton + ?Sized>(skeleton: &S, bone: HumanBone) -> ConfigResult<BoneHandle> {
    if !skeleton.is_humanoid() {
        return Err(ConfigurationError::NotBiped);
    }
    skeleton
        .resolve(bone)
        .ok_or(ConfigurationError::MissingBone(bone))
}

/// Every canonical bone resolved once against one rig.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BipedBinding {
    handles: [BoneHandle; HumanBone::COUNT],
}

impl BipedBinding {
    /// Resolve the full canonical bone set.
    ///
    /// Fails with `NotBiped` for non-humanoid rigs and `MissingBone` for the first
    /// canonical bone the rig cannot resolve.
    pub fn bind<S: Skeleton + ?Sized>(skeleton: &S) -> ConfigResult<Self> {
        let mut handles = [BoneHandle(0); HumanBone::COUNT];
        for bone in HumanBone::ALL {
            handles[bone.index()] = bind_bone(skeleton, bone)?;
        }
        Ok(Self { handles })
    }

    #[inline]
    pub fn handle(&self, bone: HumanBone) -> BoneHandle {
        self.handles[bone.index()]
    }

    /// Check that every bound handle still addresses a bone of `skeleton`.
    pub fn verify<S: Skeleton + ?Sized>(&self, skeleton: &S) -> ConfigResult<()> {
        if !skeleton.is_humanoid() {
            return Err(ConfigurationError::NotBiped);
        }
        for bone in HumanBone::ALL {
            if !skeleton.contains(self.handle(bone)) {
                return Err(ConfigurationError::StaleBinding(bone));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct RigBone {
    bone: HumanBone,
    position: Point3,
    scale: Vec3,
}

/// Flat in-memory rig.
///
/// Stores one world position and one local scale per bone. Hosts write the animated
/// positions each frame with [`HumanoidRig::set_bone_position`].
#[derive(Clone, Debug)]
pub struct HumanoidRig {
    humanoid: bool,
    root: RootTransform,
    bones: Vec<RigBone>,
}

impl HumanoidRig {
    /// An empty humanoid rig.
    pub fn new(root: RootTransform) -> Self {
        Self {
            humanoid: true,
            root,
            bones: Vec::new(),
        }
    }

    /// An empty rig that does not report a humanoid topology.
    pub fn generic(root: RootTransform) -> Self {
        Self {
            humanoid: false,
            ..Self::new(root)
        }
    }

    /// Add (or move) a bone at a world position with unit scale.
    pub fn with_bone(mut self, bone: HumanBone, position: Point3) -> Self {
        if !self.set_bone_position(bone, position) {
            self.bones.push(RigBone {
                bone,
                position,
                scale: Vec3::repeat(1.0),
            });
        }
        self
    }

    /// Remove a bone. Handles resolved earlier for later bones become stale.
    pub fn without_bone(mut self, bone: HumanBone) -> Self {
        self.bones.retain(|b| b.bone != bone);
        self
    }

    /// Write an animated world position. Returns `false` if the bone is not present.
    pub fn set_bone_position(&mut self, bone: HumanBone, position: Point3) -> bool {
        match self.bones.iter_mut().find(|b| b.bone == bone) {
            Some(b) => {
                b.position = position;
                true
            }
            None => false,
        }
    }

    pub fn position_of(&self, bone: HumanBone) -> Option<Point3> {
        self.bones.iter().find(|b| b.bone == bone).map(|b| b.position)
    }

    pub fn scale_of(&self, bone: HumanBone) -> Option<Vec3> {
        self.bones.iter().find(|b| b.bone == bone).map(|b| b.scale)
    }

    /// Move the root and every bone by `delta`.
    pub fn translate(&mut self, delta: Vec3) {
        self.root.translation += delta;
        for b in &mut self.bones {
            b.position += delta;
        }
    }
}

impl Skeleton for HumanoidRig {
    fn is_humanoid(&self) -> bool {
        self.humanoid
    }

    fn resolve(&self, bone: HumanBone) -> Option<BoneHandle> {
        self.bones
            .iter()
            .position(|b| b.bone == bone)
            .map(|i| BoneHandle(i as u32))
    }

    fn contains(&self, handle: BoneHandle) -> bool {
        (handle.0 as usize) < self.bones.len()
    }

    fn root(&self) -> RootTransform {
        self.root
    }

    fn set_root_scale(&mut self, scale: Vec3) {
        self.root.scale = scale;
    }

    fn bone_position(&self, handle: BoneHandle) -> Option<Point3> {
        self.bones.get(handle.0 as usize).map(|b| b.position)
    }

    fn set_bone_scale(&mut self, handle: BoneHandle, scale: Vec3) {
        if let Some(b) = self.bones.get_mut(handle.0 as usize) {
            b.scale = scale;
        }
    }
}

/// Height the reference bind pose is authored at (meters).
const REFERENCE_HEIGHT: f32 = 1.8;

/// Left-side and center bones of the reference bind pose at `REFERENCE_HEIGHT`.
/// Right-side bones mirror the left ones across X. The character faces +Z.
const REFERENCE_POSE: [(HumanBone, [f32; 3]); 18] = [
    (HumanBone::Hips, [0.0, 0.95, 0.0]),
    (HumanBone::Spine, [0.0, 1.05, 0.0]),
    (HumanBone::Chest, [0.0, 1.2, 0.0]),
    (HumanBone::UpperChest, [0.0, 1.32, 0.0]),
    (HumanBone::Neck, [0.0, 1.5, 0.0]),
    (HumanBone::Head, [0.0, 1.6, 0.0]),
    (HumanBone::LeftShoulder, [-0.05, 1.45, 0.0]),
    (HumanBone::LeftUpperArm, [-0.18, 1.42, 0.0]),
    (HumanBone::LeftLowerArm, [-0.45, 1.42, 0.0]),
    (HumanBone::LeftHand, [-0.7, 1.42, 0.0]),
    (HumanBone::LeftThumbProximal, [-0.74, 1.4, 0.03]),
    (HumanBone::LeftIndexProximal, [-0.78, 1.42, 0.02]),
    (HumanBone::LeftMiddleProximal, [-0.79, 1.42, 0.0]),
    (HumanBone::LeftRingProximal, [-0.78, 1.42, -0.02]),
    (HumanBone::LeftLittleProximal, [-0.76, 1.42, -0.04]),
    (HumanBone::LeftUpperLeg, [-0.1, 0.9, 0.0]),
    (HumanBone::LeftLowerLeg, [-0.1, 0.5, 0.0]),
    (HumanBone::LeftFoot, [-0.1, 0.1, 0.0]),
];

fn mirrored(bone: HumanBone) -> Option<HumanBone> {
    use HumanBone::*;
    Some(match bone {
        LeftShoulder => RightShoulder,
        LeftUpperArm => RightUpperArm,
        LeftLowerArm => RightLowerArm,
        LeftHand => RightHand,
        LeftThumbProximal => RightThumbProximal,
        LeftIndexProximal => RightIndexProximal,
        LeftMiddleProximal => RightMiddleProximal,
        LeftRingProximal => RightRingProximal,
        LeftLittleProximal => RightLittleProximal,
        LeftUpperLeg => RightUpperLeg,
        LeftLowerLeg => RightLowerLeg,
        LeftFoot => RightFoot,
        _ => return None,
    })
}

/// A complete humanoid rig in a standing bind pose of the given `height`, placed at `root`.
///
/// The ankle sits at `0.1 * height / 1.8` above the root.
pub fn reference_biped(root: RootTransform, height: f32) -> HumanoidRig {
    let k = height / REFERENCE_HEIGHT;
    let mut rig = HumanoidRig::new(root);
    for (bone, [x, y, z]) in REFERENCE_POSE {
        let local = Point3::new(x * k, y * k, z * k);
        rig = rig.with_bone(bone, root.transform_point(&local));
        if let Some(right) = mirrored(bone) {
            let local = Point3::new(-x * k, y * k, z * k);
            rig = rig.with_bone(right, root.transform_point(&local));
        }
    }
    rig
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_table_matches_discriminants() {
        for (i, bone) in HumanBone::ALL.iter().enumerate() {
            assert_eq!(bone.index(), i);
        }
    }

    #[test]
    fn reference_biped_binds_every_bone() {
        let rig = reference_biped(RootTransform::default(), 1.8);
        let binding = BipedBinding::bind(&rig).expect("reference rig is a biped");
        assert_eq!(binding.verify(&rig), Ok(()));

        let foot = rig.bone_position(binding.handle(HumanBone::RightFoot)).unwrap();
        assert!((foot.y - 0.1).abs() < 1.0e-6);
        assert!(foot.x > 0.0);
    }

    #[test]
    fn generic_rig_is_not_a_biped() {
        let rig = HumanoidRig::generic(RootTransform::default())
            .with_bone(HumanBone::LeftFoot, Point3::origin());
        assert_eq!(
            BipedBinding::bind(&rig),
            Err(ConfigurationError::NotBiped)
        );
        assert_eq!(
            bind_bone(&rig, HumanBone::LeftFoot),
            Err(ConfigurationError::NotBiped)
        );
    }

    #[test]
    fn missing_bone_is_reported_by_name() {
        let rig = reference_biped(RootTransform::default(), 1.8)
            .without_bone(HumanBone::RightLittleProximal);
        assert_eq!(
            BipedBinding::bind(&rig),
            Err(ConfigurationError::MissingBone(HumanBone::RightLittleProximal))
        );
    }

    #[test]
    fn binding_goes_stale_on_a_smaller_rig() {
        let full = reference_biped(RootTransform::default(), 1.8);
        let binding = BipedBinding::bind(&full).unwrap();
        let trimmed = full.clone().without_bone(HumanBone::Hips);
        assert!(matches!(
            binding.verify(&trimmed),
            Err(ConfigurationError::StaleBinding(_))
        ));
    }
}
