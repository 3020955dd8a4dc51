//! Core data: material constants and the mass stores for grains, wire,
//! membrane and plates.

pub mod membrane;
pub mod plate;
pub mod soa;
pub mod types;
pub mod wire;

pub use membrane::Membrane;
pub use plate::{LoadAccumulator, MeanLoads, Plate, Plates};
pub use soa::{GrainRef, GrainSoA, MassSoA};
pub use types::{GrainProperties, Material, MembraneProperties, StaticFriction, WireProperties};
pub use wire::Wire;
