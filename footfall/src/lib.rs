pub mod bitmask_flags;
pub mod constants;
pub mod error;
pub mod ik;
pub mod math;
pub mod pose;
pub mod probe;
pub mod proportion;
pub mod rapier_world;
pub mod skeleton;

pub use error::{ConfigResult, ConfigurationError};
pub use ik::{FootSlot, FootState, GroundAdaptiveIk, GroundWeight, IkSettings};
pub use math::{Point3, Quat, RootTransform, Vec3};
pub use pose::{GoalPose, PoseGoals, PoseTargets};
pub use probe::{GroundQuery, PlaneGround, PlaneSet, ProbeHit};
pub use proportion::{Calibration, ProportionParams, ProportionScaler, ScaleFactors};
pub use rapier_world::{GroundQueryWorld, GroundShapeDef, GroundStaticDef};
pub use skeleton::{BipedBinding, BoneHandle, HumanBone, HumanoidRig, Skeleton, reference_biped};
