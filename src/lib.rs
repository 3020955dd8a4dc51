//! Triaxial DEM – a discrete-element engine for triaxial compression tests.
//!
//! This crate simulates spherical grains, a reinforcing wire, a deformable
//! cylindrical membrane and two rigid plates. A run pours the specimen,
//! packs it under a confining pressure, then loads it axially while
//! recording the stress response.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

use std::path::Path;

pub use glam::{Quat, Vec3};

pub use collision::{
    evaluate, evaluate_slice, Bounds, ContactBatch, ContactInput, ContactLaw, ContactOutput, ContactSide,
    FrictionState, Grid, Lattice, VerletList,
};
pub use config::{Parameters, Pattern, SimulationConfig};
pub use crate::core::{
    GrainProperties, GrainSoA, MassSoA, Material, Membrane, MembraneProperties, Plate, Plates, StaticFriction,
    Wire, WireProperties,
};
pub use dynamics::{ForceGenerator, FrictionLaw, Gravity, Integrator, MembraneForces, WireBending, WireTension};
pub use error::{DemError, EntityKind, Result};
pub use world::{
    contact_manager::{ContactManager, ContactRecord, Interaction},
    output::{LoadSample, ResultSink, Snapshot},
    process::{Failure, ProcessState},
    Simulation,
};

/// High-level convenience wrapper that owns a [`Simulation`].
#[derive(Debug)]
pub struct TriaxialEngine {
    simulation: Simulation,
}

impl TriaxialEngine {
    /// Validates the parameters and builds the simulation.
    pub fn new(parameters: &Parameters) -> Result<Self> {
        let config = SimulationConfig::from_parameters(parameters)?;
        Ok(Self {
            simulation: Simulation::new(config)?,
        })
    }

    /// Builds an engine from a `key=value,...` parameter string.
    pub fn from_id(id: &str) -> Result<Self> {
        Self::new(&Parameters::parse(id)?)
    }

    /// Streams load results to the file at `path`.
    pub fn write_results_to(&mut self, path: &Path) -> Result<()> {
        self.simulation.set_result_sink(ResultSink::create(path)?);
        Ok(())
    }

    /// Advances the simulation by one time step.
    pub fn step(&mut self) -> ProcessState {
        self.simulation.step()
    }

    /// Runs until the process is done or failed.
    pub fn run(&mut self) -> Result<ProcessState> {
        self.simulation.run(None)
    }

    /// Enables or disables parallel contact evaluation and integration.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.simulation.set_parallel_enabled(enabled);
    }

    pub fn parallel_enabled(&self) -> bool {
        self.simulation.parallel_enabled()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }
}
