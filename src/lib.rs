//! Fatigue post-processing of hardened steel components.
//!
//! Multiaxial effective stresses (Haigh, Findley) from stress histories and
//! weakest-link failure probabilities, with probabilistic S-N curves, from
//! finite element results and hardness fields.

pub mod app_logic;
pub mod config;
pub mod criteria;
pub mod element;
pub mod error;
pub mod evaluation;
pub mod findley;
pub mod geometry;
pub mod haigh;
pub mod hazard;
pub mod io;
pub mod life;
pub mod material;
pub mod plane;
pub mod steel_data;
pub mod stress;
pub mod weakest_link;

pub use criteria::{Criterion, EffectiveStress};
pub use error::{FatigueError, Result};
pub use evaluation::evaluate_effective_stress;
pub use life::calculate_life;
pub use material::{Material, MaterialRegistry};
pub use weakest_link::{FailureProbability, WeakestLinkEvaluator};
