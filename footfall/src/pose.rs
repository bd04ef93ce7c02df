//! Pose-target interface between the solver and the animation rig.
//!
//! Reads return the rig's animated (unmodified) goals for the current frame. Writes set the
//! corrected goal and the blend weights the rig uses to interpolate toward it.

use crate::{
    ik::FootSlot,
    math::{Point3, Quat},
};

pub trait PoseTargets {
    /// Animated pelvis position for this frame.
    fn body_position(&self) -> Point3;
    fn set_body_position(&mut self, position: Point3);

    /// Animated goal position for `slot`, before any correction.
    fn goal_position(&self, slot: FootSlot) -> Point3;
    /// Animated goal rotation for `slot`, before any correction.
    fn goal_rotation(&self, slot: FootSlot) -> Quat;

    fn set_goal_position(&mut self, slot: FootSlot, position: Point3);
    fn set_goal_rotation(&mut self, slot: FootSlot, rotation: Quat);
    /// Blend weight in `[0, 1]` between the animated and the corrected position.
    fn set_goal_position_weight(&mut self, slot: FootSlot, weight: f32);
    /// Blend weight in `[0, 1]` between the animated and the corrected rotation.
    fn set_goal_rotation_weight(&mut self, slot: FootSlot, weight: f32);
}

/// One limb goal: the animated pose plus the corrected target and its weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GoalPose {
    pub animated_position: Point3,
    pub animated_rotation: Quat,
    pub position: Point3,
    pub rotation: Quat,
    pub position_weight: f32,
    pub rotation_weight: f32,
}

impl GoalPose {
    /// Animated goal with no correction applied yet.
    pub fn animated(position: Point3, rotation: Quat) -> Self {
        Self {
            animated_position: position,
            animated_rotation: rotation,
            position,
            rotation,
            position_weight: 0.0,
            rotation_weight: 0.0,
        }
    }

    /// The pose the rig ends up with after weighting.
    pub fn blended(&self) -> (Point3, Quat) {
        let position = self
            .animated_position
            .coords
            .lerp(&self.position.coords, self.position_weight);
        // Coincident or opposite rotations have no unique arc; take the nearer end.
        let rotation = self
            .animated_rotation
            .try_slerp(&self.rotation, self.rotation_weight, 1.0e-6)
            .unwrap_or(if self.rotation_weight < 0.5 {
                self.animated_rotation
            } else {
                self.rotation
            });
        (Point3::from(position), rotation)
    }
}

/// In-memory pose targets for hosts that resolve IK themselves.
///
/// Feed each animated frame with [`PoseGoals::begin_frame`], run the solver's pose pass,
/// then read [`PoseGoals::body`] and [`PoseGoals::blended`].
#[derive(Clone, Debug, PartialEq)]
pub struct PoseGoals {
    pub body: Point3,
    pub goals: [GoalPose; 2],
}

impl PoseGoals {
    pub fn new(body: Point3, right: (Point3, Quat), left: (Point3, Quat)) -> Self {
        Self {
            body,
            goals: [
                GoalPose::animated(right.0, right.1),
                GoalPose::animated(left.0, left.1),
            ],
        }
    }

    /// Replace the animated pose and drop last frame's corrections.
    pub fn begin_frame(&mut self, body: Point3, right: (Point3, Quat), left: (Point3, Quat)) {
        *self = Self::new(body, right, left);
    }

    pub fn goal(&self, slot: FootSlot) -> &GoalPose {
        &self.goals[slot.index()]
    }

    /// Weighted goal for `slot`.
    pub fn blended(&self, slot: FootSlot) -> (Point3, Quat) {
        self.goal(slot).blended()
    }
}

impl PoseTargets for PoseGoals {
    fn body_position(&self) -> Point3 {
        self.body
    }

    fn set_body_position(&mut self, position: Point3) {
        self.body = position;
    }

    fn goal_position(&self, slot: FootSlot) -> Point3 {
        self.goals[slot.index()].animated_position
    }

    fn goal_rotation(&self, slot: FootSlot) -> Quat {
        self.goals[slot.index()].animated_rotation
    }

    fn set_goal_position(&mut self, slot: FootSlot, position: Point3) {
        self.goals[slot.index()].position = position;
    }

    fn set_goal_rotation(&mut self, slot: FootSlot, rotation: Quat) {
        self.goals[slot.index()].rotation = rotation;
    }

    fn set_goal_position_weight(&mut self, slot: FootSlot, weight: f32) {
        self.goals[slot.index()].position_weight = weight.clamp(0.0, 1.0);
    }

    fn set_goal_rotation_weight(&mut self, slot: FootSlot, weight: f32) {
        self.goals[slot.index()].rotation_weight = weight.clamp(0.0, 1.0);
    }
}
