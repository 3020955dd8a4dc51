//! Triaxial test process: pour, pack under confining pressure, then load at
//! constant plate speed until the strain limit.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{Pattern, SimulationConfig};
use crate::core::{GrainSoA, LoadAccumulator, Plates, Wire};
use crate::error::{DemError, EntityKind, Result};
use crate::utils::math::{random_in_unit_disk, random_orientation};
use crate::world::output::LoadSample;

/// Consecutive pour candidates rejected for wire overlap before warning.
const REJECTION_BURST: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    Pour,
    Pack,
    Load,
    Done,
    Fail,
}

impl ProcessState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Done | Self::Fail)
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pour => "pour",
            Self::Pack => "pack",
            Self::Load => "load",
            Self::Done => "done",
            Self::Fail => "fail",
        };
        f.write_str(name)
    }
}

/// Why a run ended in [`ProcessState::Fail`].
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// State the process was in when the error surfaced.
    pub state: ProcessState,
    pub step: u64,
    pub kind: Option<EntityKind>,
    pub index: Option<usize>,
    pub quantity: Option<&'static str>,
    pub message: String,
}

impl Failure {
    pub fn new(state: ProcessState, step: u64, error: &DemError) -> Self {
        let (kind, index, quantity) = match error {
            DemError::NonFinite { kind, index, quantity } => (Some(*kind), Some(*index), Some(*quantity)),
            DemError::Domain { kind, index, .. } => (Some(*kind), Some(*index), None),
            DemError::Capacity { kind, .. } => (Some(*kind), None, None),
            _ => (None, None, None),
        };
        Self {
            state,
            step,
            kind,
            index,
            quantity,
            message: error.to_string(),
        }
    }
}

/// Drives the free end of the wire along its deposition pattern.
#[derive(Debug, Clone)]
pub struct Winch {
    pattern: Pattern,
    radius: f32,
    speed: f32,
    angle: f32,
    /// Cross pattern: radius of the current radial pass.
    current_radius: f32,
    /// Cross pattern: angle where the current tangential pass began.
    last_angle: f32,
}

impl Winch {
    /// Arc swept per tangential pass, and loop size ratio.
    pub const LOOP_ANGLE: f32 = PI * (3.0 - 2.236_068);

    pub fn new(pattern: Pattern, radius: f32, speed: f32) -> Self {
        Self {
            pattern,
            radius,
            speed,
            angle: 0.0,
            current_radius: radius,
            last_angle: 0.0,
        }
    }

    /// Target of the free end for this step, then advances the pattern.
    pub fn advance(&mut self, dt: f32) -> Option<Vec2> {
        let r = self.radius;
        let polar = |radius: f32, angle: f32| Vec2::new(radius * angle.cos(), radius * angle.sin());
        match self.pattern {
            Pattern::None => None,
            Pattern::Helix => {
                let end = polar(r, self.angle);
                self.angle += self.speed / r * dt;
                Some(end)
            }
            Pattern::Cross => {
                if self.current_radius < -r {
                    self.current_radius = r;
                    self.last_angle = self.angle + PI;
                    self.angle = self.last_angle;
                }
                if self.angle < self.last_angle + Self::LOOP_ANGLE {
                    let end = polar(r, self.angle);
                    self.angle += self.speed / r * dt;
                    Some(end)
                } else {
                    let end = polar(self.current_radius, self.angle);
                    self.current_radius -= self.speed * dt;
                    Some(end)
                }
            }
            Pattern::Loop => {
                let big = self.angle;
                let loop_radius = r * Self::LOOP_ANGLE / (2.0 * PI);
                let small = big * 2.0 * PI / Self::LOOP_ANGLE;
                let end = polar(r - loop_radius, big) + polar(loop_radius, small);
                self.angle += self.speed / loop_radius * dt;
                Some(end)
            }
        }
    }
}

/// What the pour added this step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PourUpdate {
    pub grain_added: bool,
    pub wire_added: bool,
}

/// State of the triaxial process between steps.
#[derive(Debug, Clone)]
pub struct ProcessDriver {
    state: ProcessState,
    current_height: f32,
    target_height: f32,
    winch: Winch,
    rng: StdRng,
    pressure: f32,
    /// Height when loading began.
    height0: f32,
    since_sample: f32,
    rejections: u32,
    failure: Option<Failure>,
}

impl ProcessDriver {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            state: ProcessState::Pour,
            current_height: 0.0,
            target_height: config.height,
            winch: Winch::new(config.pattern, config.pattern_radius, config.linear_speed),
            rng: StdRng::seed_from_u64(config.seed),
            pressure: 0.0,
            height0: config.height,
            since_sample: 0.0,
            rejections: 0,
            failure: None,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn current_height(&self) -> f32 {
        self.current_height
    }

    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// Packing progress in [0, 1].
    pub fn progress(&self, config: &SimulationConfig) -> f32 {
        match self.state {
            ProcessState::Pour => 0.0,
            ProcessState::Pack if config.target_pressure > 0.0 => {
                (self.pressure / config.target_pressure).min(1.0)
            }
            _ => 1.0,
        }
    }

    /// Friction ramp. Without a membrane friction is at its target from the start.
    pub fn friction_progress(&self, config: &SimulationConfig) -> f32 {
        if config.use_membrane {
            self.progress(config)
        } else {
            1.0
        }
    }

    pub fn gravity(&self, config: &SimulationConfig) -> f32 {
        let p = self.progress(config);
        config.gravity + (config.target_gravity - config.gravity) * p
    }

    pub fn membrane_viscosity(&self, config: &SimulationConfig) -> f32 {
        config.membrane_viscosity * self.progress(config)
    }

    /// Whether the pour has stopped adding material.
    pub fn generation_finished(&self, config: &SimulationConfig, grains: &GrainSoA) -> bool {
        self.current_height >= self.target_height || grains.len() >= config.target_grain_count
    }

    /// Raises the pour height, pays out wire and drops at most one grain.
    pub fn pour(&mut self, config: &SimulationConfig, grains: &mut GrainSoA, wire: &mut Wire) -> Result<PourUpdate> {
        let mut update = PourUpdate::default();
        if self.state != ProcessState::Pour || self.generation_finished(config, grains) {
            return Ok(update);
        }
        let dt = config.dt;
        self.current_height += config.vertical_speed * dt;
        let r = config.grain.radius;
        let rw = config.wire.radius;

        if let Some(end) = self.winch.advance(dt) {
            let target = Vec3::new(end.x, end.y, self.current_height + r + rw);
            match wire.last_position() {
                None => {
                    wire.push_node(target)?;
                    update.wire_added = true;
                }
                Some(last) => {
                    let relative = target - last;
                    let length = relative.length();
                    let step = config.wire.internode_length;
                    if length >= step {
                        wire.push_node(last + step * relative / length)?;
                        update.wire_added = true;
                    }
                }
            }
        }

        if config.generate_grains && self.current_height >= r {
            update.grain_added = self.drop_grain(config, grains, wire)?;
        }
        Ok(update)
    }

    fn drop_grain(&mut self, config: &SimulationConfig, grains: &mut GrainSoA, wire: &Wire) -> Result<bool> {
        let r = config.grain.radius;
        let rw = config.wire.radius;
        let xy = config.pattern_radius * random_in_unit_disk(&mut self.rng);
        let mut position = Vec3::new(xy.x, xy.y, r);
        let diameter = 2.0 * r;
        for &other in grains.positions() {
            let dxy = (other.truncate() - xy).length();
            if dxy < diameter {
                let dz = (diameter * diameter - dxy * dxy).sqrt();
                position.z = position.z.max(other.z + dz);
            }
        }
        if position.z >= self.current_height {
            return Ok(false);
        }
        let clearance = r + rw;
        if wire.nodes.positions.iter().any(|&node| node.distance(position) < clearance) {
            self.rejections += 1;
            if self.rejections % REJECTION_BURST == 0 {
                warn!("pour: {} consecutive candidates overlapped the wire", self.rejections);
            }
            return Ok(false);
        }
        self.rejections = 0;
        let rotation = random_orientation(&mut self.rng);
        grains.push(position, Vec3::ZERO, rotation)?;
        Ok(true)
    }

    /// Pour to pack once generation is done and the grains have settled.
    pub fn try_finish_pour(&mut self, config: &SimulationConfig, grains: &GrainSoA, plates: &mut Plates) -> bool {
        if self.state != ProcessState::Pour || grains.is_empty() || !self.generation_finished(config, grains) {
            return false;
        }
        if !settled(config, grains) {
            return false;
        }
        plates.mass = config.grain.mass * grains.len() as f32;
        self.state = ProcessState::Pack;
        info!(
            "pour done: {} grains, height {:.4} m, entering pack",
            grains.len(),
            self.current_height
        );
        true
    }

    /// Ramps the confining pressure and advances the top plate. Without a
    /// membrane no grain bears on the top plate, so it stays in place.
    pub fn pack(&mut self, config: &SimulationConfig, plates: &mut Plates) {
        if self.state != ProcessState::Pack {
            return;
        }
        self.pressure = (self.pressure + config.pressure_rate * config.dt).min(config.target_pressure);
        if config.use_membrane {
            plates.press(self.pressure, config.dt);
        }
    }

    /// Pack to load once the target pressure holds and the grains have settled.
    pub fn try_finish_pack(&mut self, config: &SimulationConfig, grains: &GrainSoA, plates: &mut Plates) -> bool {
        if self.state != ProcessState::Pack || self.pressure < config.target_pressure {
            return false;
        }
        if !settled(config, grains) {
            return false;
        }
        self.begin_load(plates);
        true
    }

    /// Enters the load state from wherever the process is.
    pub fn begin_load(&mut self, plates: &mut Plates) {
        plates.stop();
        self.height0 = plates.height();
        self.since_sample = 0.0;
        self.state = ProcessState::Load;
        info!("entering load at height {:.4} m", self.height0);
    }

    pub fn strain(&self, plates: &Plates) -> f32 {
        1.0 - plates.height() / self.height0
    }

    /// Closes the plates. Returns a load sample when one falls due.
    pub fn load(
        &mut self,
        config: &SimulationConfig,
        plates: &mut Plates,
        loads: &mut LoadAccumulator,
    ) -> Option<LoadSample> {
        if self.state != ProcessState::Load {
            return None;
        }
        plates.close(config.plate_speed, config.dt);
        self.since_sample += config.dt;
        let strain = self.strain(plates);
        let due = self.since_sample >= config.sample_interval || strain >= config.strain_limit;
        let sample = if due {
            self.since_sample = 0.0;
            loads
                .take()
                .map(|mean| LoadSample::from_loads(strain, &mean, config.radius, plates.height()))
        } else {
            None
        };
        if strain >= config.strain_limit {
            plates.stop();
            self.state = ProcessState::Done;
            info!("load done at strain {:.2}%", strain * 100.0);
        }
        sample
    }

    pub fn fail(&mut self, step: u64, error: &DemError) {
        if self.failure.is_none() {
            self.failure = Some(Failure::new(self.state, step, error));
        }
        self.state = ProcessState::Fail;
    }
}

fn settled(config: &SimulationConfig, grains: &GrainSoA) -> bool {
    let energy = grains.kinetic_energy(config.grain.mass, config.grain.angular_mass);
    energy / grains.len() as f32 <= config.settle_energy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Parameters;

    fn config(extra: &str) -> SimulationConfig {
        let text = format!(
            "TimeStep=1e-5,Radius=20,Pressure=80000,Speed=1,sfSpeed=1,sfLength=0.001,sfStiffness=1,sfDamping=0{extra}"
        );
        SimulationConfig::from_parameters(&Parameters::parse(&text).unwrap()).unwrap()
    }

    #[test]
    fn helix_stays_on_pattern_radius() {
        let mut winch = Winch::new(Pattern::Helix, 0.0175, 1.0);
        for _ in 0..1000 {
            let end = winch.advance(1e-4).unwrap();
            assert!((end.length() - 0.0175).abs() < 1e-5);
        }
    }

    #[test]
    fn cross_pattern_alternates_phases() {
        let mut winch = Winch::new(Pattern::Cross, 0.02, 1.0);
        let mut inside = false;
        for _ in 0..20_000 {
            let end = winch.advance(1e-5).unwrap();
            inside |= end.length() < 0.019;
        }
        assert!(inside, "radial phase never crossed the interior");
    }

    #[test]
    fn pour_adds_wire_one_internode_at_a_time() {
        let config = config(",Pattern=helix,Generate=0");
        let mut driver = ProcessDriver::new(&config);
        let mut grains = GrainSoA::with_capacity(config.target_grain_count);
        let mut wire = Wire::new(config.wire, config.wire_capacity);
        for _ in 0..500 {
            driver.pour(&config, &mut grains, &mut wire).unwrap();
        }
        assert!(wire.len() > 2);
        assert!(grains.is_empty());
        let p = &wire.nodes.positions;
        for pair in p.windows(2).skip(1) {
            let d = pair[0].distance(pair[1]);
            assert!((d - config.wire.internode_length).abs() < 1e-5, "segment {d}");
        }
    }

    #[test]
    fn poured_grains_do_not_overlap() {
        let config = config(",Pattern=none");
        let mut driver = ProcessDriver::new(&config);
        let mut grains = GrainSoA::with_capacity(config.target_grain_count);
        let mut wire = Wire::new(config.wire, 0);
        for _ in 0..3000 {
            driver.pour(&config, &mut grains, &mut wire).unwrap();
        }
        assert!(grains.len() > 1);
        let p = grains.positions();
        let d = 2.0 * config.grain.radius;
        for i in 0..p.len() {
            for j in i + 1..p.len() {
                assert!(p[i].distance(p[j]) >= d * 0.999, "{i} {j}");
            }
        }
    }

    #[test]
    fn ramp_interpolates_gravity() {
        let config = config(",G=100,TargetG=0");
        let mut driver = ProcessDriver::new(&config);
        assert_eq!(driver.gravity(&config), 100.0);
        driver.state = ProcessState::Pack;
        driver.pressure = config.target_pressure / 2.0;
        assert!((driver.gravity(&config) - 50.0).abs() < 1e-4);
        assert!((driver.membrane_viscosity(&config) - config.membrane_viscosity / 2.0).abs() < 1e-6);
    }

    #[test]
    fn failure_records_offending_entity() {
        let config = config("");
        let mut driver = ProcessDriver::new(&config);
        let error = DemError::NonFinite {
            kind: EntityKind::Grain,
            index: 7,
            quantity: "velocity",
        };
        driver.fail(42, &error);
        assert_eq!(driver.state(), ProcessState::Fail);
        let failure = driver.failure().unwrap();
        assert_eq!(failure.kind, Some(EntityKind::Grain));
        assert_eq!(failure.index, Some(7));
        assert_eq!(failure.quantity, Some("velocity"));
        assert_eq!(failure.state, ProcessState::Pour);
    }
}
