//! Proportional bone-scale retargeting.
//!
//! A handful of user sliders are turned into one uniform scale per skeleton segment.
//! Factors are derived top-down from ratios of adjacent sliders, so a child segment's
//! factor cancels its parent's and each slider's visible effect stays independent of
//! its neighbours.
//!
//! Rescaling the feet and legs moves the sole relative to the ankle, so every recompute
//! also produces a [`Calibration`]: the vertical offset and probe radius the ground IK
//! needs to keep the scaled feet planted.

use log::{debug, error};
use rand::Rng;

use crate::{
    constants::{
        DEFAULT_PROBE_RADIUS, FEET_RADIUS_RANGE, FINGERS_RANGE, LEGS_RANGE, LONG_LEG_OFFSET,
        LONG_LEG_SPAN, MIN_SEGMENT_SCALE, PROPORTION_RANGE, SHORT_LEG_OFFSET, SHORT_LEG_SPAN,
        SHOULDERS_RANGE,
    },
    error::{ConfigResult, ConfigurationError, check_range},
    math::{Vec3, inverse_lerp},
    skeleton::{BipedBinding, HumanBone, Skeleton},
};

/// User-facing proportion sliders. `1.0` everywhere is the unmodified rig.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProportionParams {
    pub height: f32,
    pub upper_body: f32,
    pub lower_body: f32,
    pub head: f32,
    pub neck: f32,
    pub waist: f32,
    pub chest: f32,
    pub spine: f32,
    pub shoulders: f32,
    pub upper_arms: f32,
    pub lower_arms: f32,
    pub hands: f32,
    pub fingers: f32,
    pub legs: f32,
    pub feet: f32,
    /// Unscaled foot probe radius (meters).
    pub feet_radius: f32,
}

impl Default for ProportionParams {
    fn default() -> Self {
        Self {
            height: 1.0,
            upper_body: 1.0,
            lower_body: 1.0,
            head: 1.0,
            neck: 1.0,
            waist: 1.0,
            chest: 1.0,
            spine: 1.0,
            shoulders: 1.0,
            upper_arms: 1.0,
            lower_arms: 1.0,
            hands: 1.0,
            fingers: 1.0,
            legs: 1.0,
            feet: 1.0,
            feet_radius: DEFAULT_PROBE_RADIUS,
        }
    }
}

impl ProportionParams {
    /// Every slider as `(name, value, range, default)`.
    fn sliders_mut(&mut self) -> [(&'static str, &mut f32, (f32, f32), f32); 16] {
        [
            ("height", &mut self.height, PROPORTION_RANGE, 1.0),
            ("upper_body", &mut self.upper_body, PROPORTION_RANGE, 1.0),
            ("lower_body", &mut self.lower_body, PROPORTION_RANGE, 1.0),
            ("head", &mut self.head, PROPORTION_RANGE, 1.0),
            ("neck", &mut self.neck, PROPORTION_RANGE, 1.0),
            ("waist", &mut self.waist, PROPORTION_RANGE, 1.0),
            ("chest", &mut self.chest, PROPORTION_RANGE, 1.0),
            ("spine", &mut self.spine, PROPORTION_RANGE, 1.0),
            ("shoulders", &mut self.shoulders, SHOULDERS_RANGE, 1.0),
            ("upper_arms", &mut self.upper_arms, PROPORTION_RANGE, 1.0),
            ("lower_arms", &mut self.lower_arms, PROPORTION_RANGE, 1.0),
            ("hands", &mut self.hands, PROPORTION_RANGE, 1.0),
            ("fingers", &mut self.fingers, FINGERS_RANGE, 1.0),
            ("legs", &mut self.legs, LEGS_RANGE, 1.0),
            ("feet", &mut self.feet, PROPORTION_RANGE, 1.0),
            ("feet_radius", &mut self.feet_radius, FEET_RADIUS_RANGE, DEFAULT_PROBE_RADIUS),
        ]
    }

    /// Reject NaN/infinite sliders and sliders outside their documented ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut copy = *self;
        for (name, value, range, _) in copy.sliders_mut() {
            check_range(name, *value, range)?;
        }
        Ok(())
    }

    /// Copy with every slider clamped into its range. NaN sliders fall back to their default.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for (_, value, range, default) in out.sliders_mut() {
            if value.is_nan() {
                *value = default;
            }
            *value = value.clamp(range.0, range.1);
        }
        out
    }

    /// Back to the unmodified rig (feet radius is kept).
    pub fn reset(&mut self) {
        *self = Self {
            feet_radius: self.feet_radius,
            ..Self::default()
        };
    }

    /// Draw new body sliders uniformly.
    ///
    /// Shoulders and fingers are drawn from the common range rather than their wider
    /// editing ranges; waist and feet radius are left alone.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        let (lo, hi) = PROPORTION_RANGE;
        self.height = rng.gen_range(lo..=hi);
        self.upper_body = rng.gen_range(lo..=hi);
        self.lower_body = rng.gen_range(lo..=hi);
        self.head = rng.gen_range(lo..=hi);
        self.neck = rng.gen_range(lo..=hi);
        self.chest = rng.gen_range(lo..=hi);
        self.shoulders = rng.gen_range(lo..=hi);
        self.upper_arms = rng.gen_range(lo..=hi);
        self.lower_arms = rng.gen_range(lo..=hi);
        self.hands = rng.gen_range(lo..=hi);
        self.fingers = rng.gen_range(lo..=hi);
        self.spine = rng.gen_range(lo..=hi);
        self.legs = rng.gen_range(LEGS_RANGE.0..=LEGS_RANGE.1);
        self.feet = rng.gen_range(lo..=hi);
    }
}

/// Per-segment uniform scale multipliers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactors {
    /// Whole-body root scale.
    pub overall: f32,
    pub spine: f32,
    pub upper_leg: f32,
    pub lower_leg: f32,
    pub feet: f32,
    /// Intermediate ratio; folded into `upper_body`, not applied to a bone.
    pub waist: f32,
    pub upper_body: f32,
    pub chest: f32,
    pub neck: f32,
    pub head: f32,
    pub shoulder: f32,
    pub upper_arm: f32,
    pub lower_arm: f32,
    pub hand: f32,
    pub finger: f32,
}

impl ScaleFactors {
    pub fn compute(p: &ProportionParams) -> Self {
        let lower_body = p.lower_body;
        let overall = (p.height + lower_body - 1.0).max(MIN_SEGMENT_SCALE);
        let spine = p.spine / lower_body;
        let upper_leg = p.legs;
        let lower_leg = 1.0 / (upper_leg * upper_leg);
        let feet = p.feet / (lower_leg * p.legs);
        let waist = p.waist / (spine * lower_body);
        let upper_body = (waist + p.upper_body - 1.0).max(MIN_SEGMENT_SCALE);
        let chest = p.chest / (waist * p.spine);

        Self {
            overall,
            spine,
            upper_leg,
            lower_leg,
            feet,
            waist,
            upper_body,
            chest,
            neck: p.neck / p.chest,
            head: p.head / p.neck,
            shoulder: p.shoulders / p.chest,
            upper_arm: p.upper_arms / p.shoulders,
            lower_arm: p.lower_arms / p.upper_arms,
            hand: p.hands / p.lower_arms,
            finger: p.fingers,
        }
    }

    /// Factor applied to `bone`. `None` for bones the scaler leaves untouched (hips).
    pub fn for_bone(&self, bone: HumanBone) -> Option<f32> {
        use HumanBone::*;
        Some(match bone {
            Hips => return None,
            Spine => self.spine,
            Chest => self.upper_body,
            UpperChest => self.chest,
            Neck => self.neck,
            Head => self.head,
            LeftShoulder | RightShoulder => self.shoulder,
            LeftUpperArm | RightUpperArm => self.upper_arm,
            LeftLowerArm | RightLowerArm => self.lower_arm,
            LeftHand | RightHand => self.hand,
            LeftUpperLeg | RightUpperLeg => self.upper_leg,
            LeftLowerLeg | RightLowerLeg => self.lower_leg,
            LeftFoot | RightFoot => self.feet,
            LeftThumbProximal | LeftIndexProximal | LeftMiddleProximal | LeftRingProximal
            | LeftLittleProximal | RightThumbProximal | RightIndexProximal
            | RightMiddleProximal | RightRingProximal | RightLittleProximal => self.finger,
        })
    }

    /// Every factor, for range checks.
    pub fn all(&self) -> [f32; 15] {
        [
            self.overall,
            self.spine,
            self.upper_leg,
            self.lower_leg,
            self.feet,
            self.waist,
            self.upper_body,
            self.chest,
            self.neck,
            self.head,
            self.shoulder,
            self.upper_arm,
            self.lower_arm,
            self.hand,
            self.finger,
        ]
    }
}

/// Inputs the ground IK needs after a rescale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    /// Vertical correction for the moved foot plane (meters, root scale applied).
    pub offset: f32,
    /// Foot probe sphere radius (meters).
    pub probe_radius: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            offset: 0.0,
            probe_radius: DEFAULT_PROBE_RADIUS,
        }
    }
}

/// Offset compensating the leg slider's asymmetric effect on stance height.
#[inline]
pub fn leg_offset(legs: f32) -> f32 {
    if legs > 1.0 {
        inverse_lerp(LONG_LEG_SPAN.0, LONG_LEG_SPAN.1, legs) * LONG_LEG_OFFSET
    } else {
        inverse_lerp(SHORT_LEG_SPAN.0, SHORT_LEG_SPAN.1, legs) * SHORT_LEG_OFFSET
    }
}

/// Calibration produced by `params` on a rig whose bind-pose ankle sits `ankle_height`
/// above the root.
pub fn calibration_for(params: &ProportionParams, ankle_height: f32) -> Calibration {
    let factors = ScaleFactors::compute(params);
    let feet_offset = ankle_height * factors.feet - ankle_height;
    Calibration {
        offset: (feet_offset + leg_offset(params.legs)) * factors.overall,
        probe_radius: params.feet_radius * factors.overall * params.feet,
    }
}

/// Applies proportion sliders to one bound biped rig.
///
/// The ankle height is measured once at construction, so construct before any scaling.
#[derive(Clone, Debug)]
pub struct ProportionScaler {
    binding: BipedBinding,
    ankle_height: f32,
    params: ProportionParams,
}

impl ProportionScaler {
    /// Bind the rig and capture the bind-pose ankle height.
    pub fn new<S: Skeleton + ?Sized>(skeleton: &S, params: ProportionParams) -> ConfigResult<Self> {
        let binding = BipedBinding::bind(skeleton).inspect_err(|e| {
            error!("proportion scaler binding failed: {e}");
        })?;
        params.validate()?;

        let root_y = skeleton.root().translation.y;
        let ankle_height = skeleton
            .bone_position(binding.handle(HumanBone::RightFoot))
            .map(|p| p.y - root_y)
            .ok_or(ConfigurationError::StaleBinding(HumanBone::RightFoot))?;

        Ok(Self {
            binding,
            ankle_height,
            params,
        })
    }

    pub fn params(&self) -> &ProportionParams {
        &self.params
    }

    pub fn ankle_height(&self) -> f32 {
        self.ankle_height
    }

    pub fn binding(&self) -> &BipedBinding {
        &self.binding
    }

    /// Replace the sliders. Rejected sliders leave the current ones in place.
    pub fn set_params(&mut self, params: ProportionParams) -> ConfigResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn factors(&self) -> ScaleFactors {
        ScaleFactors::compute(&self.params)
    }

    pub fn calibration(&self) -> Calibration {
        calibration_for(&self.params, self.ankle_height)
    }

    /// Write every segment scale and the root scale, and return the new calibration.
    ///
    /// Nothing is written if the binding no longer matches `skeleton`.
    pub fn apply<S: Skeleton + ?Sized>(&self, skeleton: &mut S) -> ConfigResult<Calibration> {
        self.binding.verify(skeleton).inspect_err(|e| {
            error!("refusing to scale: {e}");
        })?;

        let factors = self.factors();
        skeleton.set_root_scale(Vec3::repeat(factors.overall));
        for bone in HumanBone::ALL {
            if let Some(s) = factors.for_bone(bone) {
                skeleton.set_bone_scale(self.binding.handle(bone), Vec3::repeat(s));
            }
        }

        let calibration = self.calibration();
        debug!(
            "proportions applied: overall={:.3} feet={:.3} offset={:.4} radius={:.4}",
            factors.overall, factors.feet, calibration.offset, calibration.probe_radius
        );
        Ok(calibration)
    }

    /// Draw new sliders and apply them.
    pub fn randomize<R: Rng, S: Skeleton + ?Sized>(
        &mut self,
        rng: &mut R,
        skeleton: &mut S,
    ) -> ConfigResult<Calibration> {
        self.params.randomize(rng);
        self.apply(skeleton)
    }

    /// Reset the sliders and apply them.
    pub fn reset<S: Skeleton + ?Sized>(&mut self, skeleton: &mut S) -> ConfigResult<Calibration> {
        self.params.reset();
        self.apply(skeleton)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        math::RootTransform,
        skeleton::{HumanoidRig, reference_biped},
    };
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const EPS: f32 = 1.0e-5;

    fn rig() -> HumanoidRig {
        reference_biped(RootTransform::default(), 1.8)
    }

    #[test]
    fn unit_sliders_are_identity() {
        let factors = ScaleFactors::compute(&ProportionParams::default());
        for f in factors.all() {
            assert!((f - 1.0).abs() < EPS, "factor {f} should be 1");
        }

        let mut rig = rig();
        let scaler = ProportionScaler::new(&rig, ProportionParams::default()).unwrap();
        let cal = scaler.apply(&mut rig).unwrap();
        assert!(cal.offset.abs() < EPS);
        assert!((cal.probe_radius - DEFAULT_PROBE_RADIUS).abs() < EPS);
        for bone in HumanBone::ALL {
            assert_eq!(rig.scale_of(bone), Some(Vec3::repeat(1.0)));
        }
        assert_eq!(rig.root().scale, Vec3::repeat(1.0));
    }

    #[test]
    fn large_feet_raise_the_offset() {
        let params = ProportionParams {
            feet: 1.5,
            ..ProportionParams::default()
        };
        let factors = ScaleFactors::compute(&params);
        assert!((factors.feet - 1.5).abs() < EPS);
        assert!((factors.lower_leg - 1.0).abs() < EPS);
        assert!((factors.overall - 1.0).abs() < EPS);

        let mut rig = rig();
        let scaler = ProportionScaler::new(&rig, params).unwrap();
        assert!((scaler.ankle_height() - 0.1).abs() < EPS);
        let cal = scaler.apply(&mut rig).unwrap();
        assert!((cal.offset - 0.05).abs() < EPS, "offset was {}", cal.offset);
        assert!((cal.probe_radius - 0.075).abs() < EPS);
        assert_eq!(rig.scale_of(HumanBone::LeftFoot), Some(Vec3::repeat(1.5)));
    }

    #[test]
    fn leg_slider_offsets_at_both_ends() {
        assert!((leg_offset(1.2) - LONG_LEG_OFFSET).abs() < EPS);
        assert!((leg_offset(0.8) - SHORT_LEG_OFFSET).abs() < EPS);
        assert!(leg_offset(1.0).abs() < EPS);

        // Long legs: feet scale 1.2 lifts the sole by 0.02, the leg term drops 0.01.
        let long = ProportionParams {
            legs: 1.2,
            ..ProportionParams::default()
        };
        assert!((calibration_for(&long, 0.1).offset - 0.01).abs() < EPS);

        // Short legs: feet scale 0.8 lowers the sole by 0.02, the leg term adds 0.03.
        let short = ProportionParams {
            legs: 0.8,
            ..ProportionParams::default()
        };
        assert!((calibration_for(&short, 0.1).offset - 0.01).abs() < EPS);
    }

    #[test]
    fn overall_scale_multiplies_offset_and_radius() {
        let params = ProportionParams {
            height: 1.2,
            feet: 1.5,
            ..ProportionParams::default()
        };
        let cal = calibration_for(&params, 0.1);
        assert!((cal.offset - 0.05 * 1.2).abs() < EPS);
        assert!((cal.probe_radius - 0.05 * 1.2 * 1.5).abs() < EPS);
    }

    #[test]
    fn factors_stay_positive_across_slider_ranges() {
        let check = |p: &ProportionParams| {
            for f in ScaleFactors::compute(p).all() {
                assert!(f.is_finite() && f > 0.0, "{p:?} produced factor {f}");
            }
        };

        let mut low = ProportionParams::default();
        let mut high = ProportionParams::default();
        for (_, v, r, _) in low.sliders_mut() {
            *v = r.0;
        }
        for (_, v, r, _) in high.sliders_mut() {
            *v = r.1;
        }
        check(&low);
        check(&high);

        let mut rng = Pcg32::seed_from_u64(0x5eed);
        for _ in 0..5_000 {
            let mut p = ProportionParams::default();
            for (_, v, r, _) in p.sliders_mut() {
                *v = rng.gen_range(r.0..=r.1);
            }
            check(&p);
        }
    }

    #[test]
    fn applying_twice_is_bit_identical() {
        let params = ProportionParams {
            height: 1.3,
            spine: 0.7,
            legs: 1.1,
            feet: 0.6,
            fingers: 2.2,
            ..ProportionParams::default()
        };
        let mut rig = rig();
        let scaler = ProportionScaler::new(&rig, params).unwrap();

        let first = scaler.apply(&mut rig).unwrap();
        let scales: Vec<_> = HumanBone::ALL.iter().map(|&b| rig.scale_of(b)).collect();
        let second = scaler.apply(&mut rig).unwrap();
        let again: Vec<_> = HumanBone::ALL.iter().map(|&b| rig.scale_of(b)).collect();

        assert_eq!(first.offset.to_bits(), second.offset.to_bits());
        assert_eq!(first.probe_radius.to_bits(), second.probe_radius.to_bits());
        assert_eq!(scales, again);
    }

    #[test]
    fn validation_and_clamping() {
        let bad = ProportionParams {
            legs: 1.4,
            ..ProportionParams::default()
        };
        assert_eq!(
            bad.validate(),
            Err(ConfigurationError::OutOfRange {
                name: "legs",
                value: 1.4,
                min: 0.8,
                max: 1.2
            })
        );
        assert_eq!(bad.clamped().legs, 1.2);

        let nan = ProportionParams {
            head: f32::NAN,
            ..ProportionParams::default()
        };
        assert_eq!(
            nan.validate(),
            Err(ConfigurationError::NonFinite { name: "head" })
        );
        assert_eq!(nan.clamped().validate(), Ok(()));
        assert_eq!(nan.clamped().head, 1.0);

        let nan_radius = ProportionParams {
            feet_radius: f32::NAN,
            feet: f32::NAN,
            ..ProportionParams::default()
        };
        let fixed = nan_radius.clamped();
        assert_eq!(fixed.feet_radius, DEFAULT_PROBE_RADIUS);
        assert_eq!(fixed.feet, 1.0);

        let mut rig = rig();
        let mut scaler = ProportionScaler::new(&rig, ProportionParams::default()).unwrap();
        assert!(scaler.set_params(bad).is_err());
        assert_eq!(scaler.params(), &ProportionParams::default());
        assert!(scaler.apply(&mut rig).is_ok());
    }

    #[test]
    fn randomize_and_reset_stay_in_range() {
        let mut rig = rig();
        let mut scaler = ProportionScaler::new(&rig, ProportionParams::default()).unwrap();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            scaler.randomize(&mut rng, &mut rig).unwrap();
            assert_eq!(scaler.params().validate(), Ok(()));
        }
        let cal = scaler.reset(&mut rig).unwrap();
        assert!(cal.offset.abs() < EPS);
        assert_eq!(rig.scale_of(HumanBone::Head), Some(Vec3::repeat(1.0)));
    }

    #[test]
    fn non_biped_rigs_are_refused() {
        let generic = HumanoidRig::generic(RootTransform::default());
        assert_eq!(
            ProportionScaler::new(&generic, ProportionParams::default()).unwrap_err(),
            ConfigurationError::NotBiped
        );

        let full = rig();
        let scaler = ProportionScaler::new(&full, ProportionParams::default()).unwrap();
        let mut trimmed = full.without_bone(HumanBone::Head);
        assert!(matches!(
            scaler.apply(&mut trimmed),
            Err(ConfigurationError::StaleBinding(_))
        ));
    }
}
