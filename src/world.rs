use std::path::Path;
use std::time::Instant;

use glam::{Quat, Vec2, Vec3};
use log::{error, info};

use crate::{
    collision::Bounds,
    config::SimulationConfig,
    core::{GrainSoA, LoadAccumulator, Membrane, Plates, Wire},
    dynamics::{ForceGenerator, Gravity, Integrator, MembraneForces, WireBending, WireTension},
    error::Result,
    utils::{
        logging::warn_if_step_budget_exceeded,
        profiling::{Phase, PhaseTimer},
        StepProfiler,
    },
};

pub mod contact_manager;
pub mod output;
pub mod process;

use contact_manager::{ContactContext, ContactManager, MaxSpeeds};
use output::{void_ratio, LoadRecorder, LoadSample, ResultSink, Snapshot, SnapshotForce, SnapshotPoint};
use process::{Failure, ProcessDriver, ProcessState};

/// Steps between progress log lines in [`Simulation::run`].
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Wall time one step may take before a warning is logged.
pub const STEP_BUDGET: std::time::Duration = std::time::Duration::from_millis(250);

/// Single owner of all simulation state: the mass stores, the neighbor lists
/// and the process driver.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    pub grains: GrainSoA,
    pub wire: Wire,
    pub membrane: Option<Membrane>,
    pub plates: Plates,
    contacts: ContactManager,
    process: ProcessDriver,
    integrator: Integrator,
    profiler: StepProfiler,
    loads: LoadAccumulator,
    recorder: LoadRecorder,
    safety: Bounds,
    speeds: MaxSpeeds,
    step_count: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let membrane = if config.use_membrane {
            Some(Membrane::new(config.membrane)?)
        } else {
            None
        };
        let confining = if config.use_membrane {
            config.radius
        } else {
            config.lattice_radius()
        };
        info!(
            "simulation: radius {:.4} m, {} grains planned, pattern {:?}, membrane {}",
            config.radius,
            config.target_grain_count,
            config.pattern,
            config.use_membrane
        );
        Ok(Self {
            grains: GrainSoA::with_capacity(config.target_grain_count),
            wire: Wire::new(config.wire, config.wire_capacity),
            membrane,
            plates: Plates::new(config.height, config.radius),
            contacts: ContactManager::new(&config),
            process: ProcessDriver::new(&config),
            integrator: Integrator::new(config.dt),
            profiler: StepProfiler::default(),
            loads: LoadAccumulator::default(),
            recorder: LoadRecorder::default(),
            safety: Bounds::safety(confining, config.height),
            speeds: MaxSpeeds::default(),
            step_count: 0,
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn contacts(&self) -> &ContactManager {
        &self.contacts
    }

    pub fn process(&self) -> &ProcessDriver {
        &self.process
    }

    pub fn state(&self) -> ProcessState {
        self.process.state()
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.process.failure()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn profiler(&self) -> &StepProfiler {
        &self.profiler
    }

    pub fn samples(&self) -> &[LoadSample] {
        self.recorder.samples()
    }

    pub fn strain(&self) -> f32 {
        self.process.strain(&self.plates)
    }

    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.integrator.set_parallel(enabled);
    }

    pub fn parallel_enabled(&self) -> bool {
        self.integrator.is_parallel()
    }

    pub fn set_result_sink(&mut self, sink: ResultSink) {
        self.recorder.set_sink(sink);
    }

    /// Places a grain directly, bypassing the pour.
    pub fn add_grain(&mut self, position: Vec3, velocity: Vec3, rotation: Quat) -> Result<usize> {
        let index = self.grains.push(position, velocity, rotation)?;
        self.contacts.invalidate_grains();
        Ok(index)
    }

    /// Appends a node at the free end of the wire.
    pub fn add_wire_node(&mut self, position: Vec3) -> Result<usize> {
        let index = self.wire.push_node(position)?;
        self.contacts.invalidate_wire();
        Ok(index)
    }

    /// Skips ahead to loading from the current configuration.
    pub fn start_loading(&mut self) -> Result<()> {
        self.plates.mass = self.config.grain.mass * self.grains.len() as f32;
        self.process.begin_load(&mut self.plates);
        self.begin_recording()
    }

    fn begin_recording(&mut self) -> Result<()> {
        let ratio = void_ratio(
            self.grains.len(),
            self.config.grain.radius,
            self.config.radius,
            self.plates.height(),
        );
        info!("void ratio {ratio:.4}");
        self.recorder.begin(ratio)
    }

    /// Advances one time step. Any error ends the run in [`ProcessState::Fail`].
    pub fn step(&mut self) -> ProcessState {
        if self.process.state().is_finished() {
            return self.process.state();
        }
        if let Err(err) = self.advance() {
            error!("step {} failed in {}: {err}", self.step_count, self.process.state());
            self.process.fail(self.step_count, &err);
        }
        self.step_count += 1;
        self.process.state()
    }

    /// Steps until the process finishes or `max_steps` elapse, flushing the
    /// result sink at the end.
    pub fn run(&mut self, max_steps: Option<u64>) -> Result<ProcessState> {
        let start = self.step_count;
        while !self.process.state().is_finished() {
            if max_steps.is_some_and(|limit| self.step_count - start >= limit) {
                break;
            }
            self.step();
            if self.step_count % PROGRESS_INTERVAL == 0 {
                info!(
                    "step {}: {} grains, {} wire nodes, state {}, pour height {:.4} m, plate gap {:.4} m, strain {:.2}%",
                    self.step_count,
                    self.grains.len(),
                    self.wire.len(),
                    self.process.state(),
                    self.process.current_height(),
                    self.plates.height(),
                    self.strain().max(0.0) * 100.0
                );
                self.profiler.report();
                self.profiler.reset();
            }
        }
        self.recorder.flush()?;
        Ok(self.process.state())
    }

    fn advance(&mut self) -> Result<()> {
        let step_start = Instant::now();
        {
            let _phase = PhaseTimer::new(&mut self.profiler, Phase::Process);
            let update = self.process.pour(&self.config, &mut self.grains, &mut self.wire)?;
            if update.grain_added {
                self.contacts.invalidate_grains();
            }
            if update.wire_added {
                self.contacts.invalidate_wire();
            }
        }

        let radial = self.compute_forces()?;

        {
            let _phase = PhaseTimer::new(&mut self.profiler, Phase::Integration);
            let integrator = &self.integrator;
            let wire_nodes = self.wire.len();
            self.speeds.grain = integrator.integrate_grains(&mut self.grains, &self.config.grain);
            self.speeds.wire =
                integrator.integrate_nodes(&mut self.wire.nodes, self.config.wire.mass, 0..wire_nodes, 1.0);
            if let Some(membrane) = self.membrane.as_mut() {
                let viscosity = self.process.membrane_viscosity(&self.config);
                self.speeds.membrane = integrator.integrate_membrane(membrane, viscosity);
            }
        }
        self.contacts.advance(self.speeds, self.config.dt);

        self.grains.check_finite()?;
        self.wire.nodes.check_finite()?;
        if let Some(membrane) = &self.membrane {
            membrane.nodes.check_finite()?;
        }
        self.plates.check_finite()?;

        let update_start = Instant::now();
        self.update_process(radial)?;
        self.profiler.process_time += update_start.elapsed();
        if let Some(membrane) = self.membrane.as_mut() {
            let (bottom, top) = (self.plates.bottom, self.plates.top);
            membrane.follow_plates(bottom.z, bottom.velocity, top.z, top.velocity);
        }

        let elapsed = step_start.elapsed();
        warn_if_step_budget_exceeded(elapsed, STEP_BUDGET);
        self.profiler.total_time += elapsed;
        self.profiler.steps += 1;
        self.profiler.rebuilds = self.contacts.rebuilds();
        self.profiler.contact_count = self.contacts.contact_count();
        Ok(())
    }

    /// Seeds gravity and accumulates every contact and internal force of the
    /// current configuration. Returns the radial load on the confinement.
    pub fn compute_forces(&mut self) -> Result<f32> {
        let config = &self.config;
        let gravity = self.process.gravity(config);
        Gravity {
            mass: config.grain.mass,
            gravity,
        }
        .apply(&mut self.grains);
        Gravity {
            mass: config.wire.mass,
            gravity,
        }
        .apply(&mut self.wire.nodes);
        if let Some(membrane) = self.membrane.as_mut() {
            membrane.nodes.clear_forces();
        }
        self.plates.clear_forces();

        if !config.use_membrane {
            reproject(&mut self.grains, config.lattice_radius());
        }

        let ctx = ContactContext {
            grain: &config.grain,
            wire: &config.wire,
            cylinder_radius: config.radius,
            safety: self.safety,
            friction_progress: self.process.friction_progress(config),
            parallel: self.integrator.is_parallel(),
        };

        {
            let _phase = PhaseTimer::new(&mut self.profiler, Phase::Neighbors);
            self.contacts.refresh_grain_grain(&ctx, &self.grains)?;
        }

        let mut radial = 0.0;
        {
            let _phase = PhaseTimer::new(&mut self.profiler, Phase::Contacts);
            self.contacts.grain_plates(&ctx, &mut self.grains, &mut self.plates, self.membrane.is_some());
            if self.membrane.is_none() {
                radial += self.contacts.grain_side(&ctx, &mut self.grains);
            }
            self.contacts.grain_grain(&ctx, &mut self.grains)?;
            if let Some(membrane) = self.membrane.as_mut() {
                radial += self.contacts.grain_membrane(&ctx, &mut self.grains, membrane)?;
            }
            if !self.wire.is_empty() {
                self.contacts.grain_wire(&ctx, &mut self.grains, &mut self.wire)?;
                self.contacts.wire_bottom(&ctx, &mut self.wire, &self.plates);
            }
        }

        {
            let _phase = PhaseTimer::new(&mut self.profiler, Phase::InternalForces);
            if let Some(membrane) = self.membrane.as_mut() {
                MembraneForces {
                    pressure: self.process.pressure(),
                }
                .apply(membrane);
            }
            WireTension.apply(&mut self.wire);
            WireBending.apply(&mut self.wire);
        }
        Ok(radial)
    }

    fn update_process(&mut self, radial: f32) -> Result<()> {
        let config = &self.config;
        match self.process.state() {
            ProcessState::Pour => {
                self.process.try_finish_pour(config, &self.grains, &mut self.plates);
            }
            ProcessState::Pack => {
                self.process.pack(config, &mut self.plates);
                if self.process.try_finish_pack(config, &self.grains, &mut self.plates) {
                    self.begin_recording()?;
                }
            }
            ProcessState::Load => {
                self.loads.add(&self.plates, radial);
                if let Some(sample) = self.process.load(config, &mut self.plates, &mut self.loads) {
                    self.recorder.record(sample)?;
                }
            }
            ProcessState::Done | ProcessState::Fail => {}
        }
        Ok(())
    }

    /// Gathers positions, per-element contact statistics and contact forces.
    pub fn snapshot(&self) -> Snapshot {
        let config = &self.config;
        let mut grains: Vec<SnapshotPoint> = self
            .grains
            .positions()
            .iter()
            .map(|&position| SnapshotPoint {
                position,
                contacts: 0,
                energy: 0.0,
            })
            .collect();
        let mut wire: Vec<SnapshotPoint> = self
            .wire
            .nodes
            .positions
            .iter()
            .map(|&position| SnapshotPoint {
                position,
                contacts: 0,
                energy: 0.0,
            })
            .collect();

        let c = &self.contacts;
        for (a, b, energy) in c.grain_grain.elastic_energy() {
            for index in [a, b] {
                grains[index as usize].contacts += 1;
                grains[index as usize].energy += energy / 2.0;
            }
        }
        for set in [&c.grain_membrane, &c.grain_bottom, &c.grain_top, &c.grain_side] {
            for (a, _, energy) in set.elastic_energy() {
                grains[a as usize].contacts += 1;
                grains[a as usize].energy += energy;
            }
        }
        for (a, b, energy) in c.grain_wire.elastic_energy() {
            grains[a as usize].contacts += 1;
            grains[a as usize].energy += energy / 2.0;
            wire[b as usize].contacts += 1;
            wire[b as usize].energy += energy / 2.0;
        }
        for (a, _, energy) in c.wire_bottom.elastic_energy() {
            wire[a as usize].contacts += 1;
            wire[a as usize].energy += energy;
        }

        let forces = |records: &[contact_manager::ContactRecord]| -> Vec<SnapshotForce> {
            records
                .iter()
                .map(|record| SnapshotForce {
                    a: record.point_a,
                    b: record.point_b,
                    force: record.force,
                })
                .collect()
        };
        let mut grain_side = forces(&c.grain_membrane.records);
        grain_side.extend(forces(&c.grain_side.records));

        let side: Vec<(Vec3, Vec3)> = self
            .membrane
            .as_ref()
            .map(|membrane| {
                let p = &membrane.nodes.positions;
                membrane.edges().map(|(a, b)| (p[a], p[b])).collect()
            })
            .unwrap_or_default();

        let nodes = &self.wire.nodes.positions;
        let wire_wire = (0..self.wire.len().saturating_sub(1))
            .map(|i| SnapshotForce {
                a: nodes[i],
                b: nodes[i + 1],
                force: self.wire.segment_tension(i),
            })
            .collect();

        Snapshot {
            grain_radius: config.grain.radius,
            wire_radius: config.wire.radius,
            grains,
            wire,
            side,
            grain_grain: forces(&c.grain_grain.records),
            grain_side,
            grain_wire: forces(&c.grain_wire.records),
            wire_wire,
        }
    }

    pub fn write_snapshot(&self, base: &Path) -> Result<()> {
        self.snapshot().write(base)
    }
}

/// Pulls grains that escaped past `radius` back onto it and stops their
/// horizontal motion.
fn reproject(grains: &mut GrainSoA, radius: f32) {
    let mass = &mut grains.mass;
    for (p, v) in mass.positions.iter_mut().zip(mass.velocities.iter_mut()) {
        let xy = Vec2::new(p.x, p.y);
        let length = xy.length();
        if length > radius {
            let clamped = xy * (radius / length);
            p.x = clamped.x;
            p.y = clamped.y;
            v.x = 0.0;
            v.y = 0.0;
        }
    }
}
