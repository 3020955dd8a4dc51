//! Simulation dynamics: friction laws, internal forces, integration and the
//! fork-join helpers they run on.

pub mod forces;
pub mod friction;
pub mod integrator;
pub mod parallel;

pub use forces::{ForceGenerator, Gravity, MembraneForces, WireBending, WireTension};
pub use friction::{FrictionLaw, Regime};
pub use integrator::Integrator;
