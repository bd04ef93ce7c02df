/*!
Ground-adaptive foot and pelvis IK.

- settings: tuning and option flags (velocity scaling, asymmetric rise/fall)
- weight:   ground confidence weight and root velocity factor
- foot:     foot slots and per-foot probe state
- solver:   the three-phase solver driven by the host loop
*/

pub mod foot;
pub mod settings;
pub mod solver;
pub mod weight;

pub use foot::{FootSlot, FootState};
pub use settings::IkSettings;
pub use solver::GroundAdaptiveIk;
pub use weight::{GroundWeight, velocity_factor};
