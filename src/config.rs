//! Global configuration for the triaxial DEM engine.
//!
//! [`Parameters`] is the flat key/value set a run is started from, using the
//! same key names and input units as the experiment sweeps (millimetres for
//! radii and speeds, MPa for the shear modulus). [`SimulationConfig`] is the
//! validated form in SI units that the engine actually consumes.

use std::f32::consts::PI;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::core::types::{
    GrainProperties, Material, MembraneProperties, StaticFriction, WireProperties,
};
use crate::error::{DemError, Result};

/// Gravity applied while pouring (N/kg).
pub const DEFAULT_GRAVITY: f32 = 4000.0 * 10.0;

/// Gravity targeted at the end of the pressure ramp (N/kg).
pub const DEFAULT_TARGET_GRAVITY: f32 = 0.0;

/// Grain radius in millimetres.
pub const DEFAULT_GRAIN_RADIUS_MM: f32 = 2.5;

/// Grain density (kg/m³).
pub const DEFAULT_GRAIN_DENSITY: f32 = 7.8e3;

/// Grain shear modulus in MPa.
pub const DEFAULT_GRAIN_SHEAR_MODULUS_MPA: f32 = 77000.0;

pub const DEFAULT_GRAIN_POISSON_RATIO: f32 = 0.28;

/// Winch vertical speed while pouring (m/s).
pub const DEFAULT_VERTICAL_SPEED: f32 = 1.0;

/// Winch tangential speed along the wire pattern (m/s).
pub const DEFAULT_LINEAR_SPEED: f32 = 1.0;

/// Normal damping rate, as a fraction of critical damping.
pub const DEFAULT_NORMAL_DAMPING_RATE: f32 = 1.0;

/// Dynamic friction coefficients per interaction type.
pub const FRICTION_GRAIN_OBSTACLE: f32 = 0.228;
pub const FRICTION_GRAIN_MEMBRANE: f32 = 0.228;
pub const FRICTION_GRAIN_GRAIN: f32 = 0.096;
pub const FRICTION_GRAIN_WIRE: f32 = 0.228;
pub const FRICTION_WIRE_BOTTOM: f32 = 1.0;

/// Spin friction factor applied against grain z spin on obstacles.
pub const DEFAULT_SPIN_FRICTION: f32 = 1.0;

/// Per-grain kinetic energy below which the pile is considered settled (J).
pub const DEFAULT_SETTLE_ENERGY: f32 = 1e-6;

/// Axial strain at which loading ends.
pub const DEFAULT_STRAIN_LIMIT: f32 = 1.0 / 8.0;

/// Load samples are taken every this many steps unless overridden.
pub const DEFAULT_SAMPLE_STEPS: u32 = 256;

/// Pressure ramp duration when no explicit rate is given (s).
pub const DEFAULT_PRESSURE_RAMP_TIME: f32 = 0.05;

/// Velocity retention factor of the membrane once fully released.
pub const DEFAULT_MEMBRANE_VISCOSITY: f32 = 0.999;

pub const WIRE_ELASTIC_MODULUS: f32 = 1e8;
pub const WIRE_DENSITY: f32 = 1e3;

pub const MEMBRANE_ELASTIC_MODULUS: f32 = 1.5e6;
pub const MEMBRANE_THICKNESS: f32 = 0.3e-3;
pub const MEMBRANE_DENSITY: f32 = 1e3;
pub const MEMBRANE_POISSON_RATIO: f32 = 0.48;

/// Random packing void fraction used to size the grain store.
pub const PACKING_VOID_FACTOR: f32 = 0.611;

const MM: f32 = 1e-3;
const MPA: f32 = 1e6;

/// Winding pattern laid down by the wire winch while pouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pattern {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "helix")]
    Helix,
    /// Helix reinforced by radial crossings.
    #[serde(rename = "radial", alias = "cross")]
    Cross,
    /// Epicyclic loops.
    #[serde(rename = "spiral", alias = "loop")]
    Loop,
}

/// Raw run parameters, keyed the way experiment sweeps name them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(rename = "TimeStep")]
    pub time_step: f32,
    /// Cylinder radius (mm).
    #[serde(rename = "Radius")]
    pub radius: f32,
    /// Target confining pressure (Pa).
    #[serde(rename = "Pressure")]
    pub pressure: f32,
    /// Plate closing speed (mm/s).
    #[serde(rename = "Speed")]
    pub plate_speed: f32,
    /// Static friction speed threshold (mm/s).
    #[serde(rename = "sfSpeed")]
    pub static_friction_speed: f32,
    /// Static friction length threshold (m).
    #[serde(rename = "sfLength")]
    pub static_friction_length: f32,
    /// Static friction stiffness (1/m).
    #[serde(rename = "sfStiffness")]
    pub static_friction_stiffness: f32,
    /// Static friction damping (N·s/m).
    #[serde(rename = "sfDamping")]
    pub static_friction_damping: f32,

    #[serde(rename = "Pattern", default)]
    pub pattern: Pattern,
    #[serde(rename = "grainRadius", default = "default_grain_radius")]
    pub grain_radius: f32,
    #[serde(rename = "grainDensity", default = "default_grain_density")]
    pub grain_density: f32,
    #[serde(rename = "grainShearModulus", default = "default_grain_shear_modulus")]
    pub grain_shear_modulus: f32,
    #[serde(rename = "grainPoissonRatio", default = "default_grain_poisson_ratio")]
    pub grain_poisson_ratio: f32,
    #[serde(rename = "G", default = "default_gravity")]
    pub gravity: f32,
    #[serde(rename = "TargetG", default = "default_target_gravity")]
    pub target_gravity: f32,
    #[serde(rename = "verticalSpeed", default = "default_vertical_speed")]
    pub vertical_speed: f32,
    #[serde(rename = "linearSpeed", default = "default_linear_speed")]
    pub linear_speed: f32,
    #[serde(
        rename = "Membrane",
        default = "default_enabled",
        deserialize_with = "deserialize_flag"
    )]
    pub membrane: bool,
    #[serde(rename = "nDamping", default = "default_normal_damping")]
    pub normal_damping: f32,
    #[serde(rename = "Seed", default)]
    pub seed: u64,
    #[serde(
        rename = "Generate",
        default = "default_enabled",
        deserialize_with = "deserialize_flag"
    )]
    pub generate: bool,
    #[serde(rename = "StrainLimit", default = "default_strain_limit")]
    pub strain_limit: f32,
    /// Pressure ramp rate (Pa/s); derived from the target when absent.
    #[serde(rename = "PressureRate", default)]
    pub pressure_rate: Option<f32>,
    /// Simulated time between load samples (s); derived from the time step when absent.
    #[serde(rename = "SampleInterval", default)]
    pub sample_interval: Option<f32>,
    #[serde(rename = "SettleEnergy", default = "default_settle_energy")]
    pub settle_energy: f32,
    #[serde(rename = "MembraneViscosity", default = "default_membrane_viscosity")]
    pub membrane_viscosity: f32,
    #[serde(rename = "GrainGrainFriction", default = "default_grain_grain_friction")]
    pub grain_grain_friction: f32,
    #[serde(rename = "GrainObstacleFriction", default = "default_grain_obstacle_friction")]
    pub grain_obstacle_friction: f32,
    #[serde(rename = "GrainMembraneFriction", default = "default_grain_membrane_friction")]
    pub grain_membrane_friction: f32,
    #[serde(rename = "GrainWireFriction", default = "default_grain_wire_friction")]
    pub grain_wire_friction: f32,
    #[serde(rename = "WireBottomFriction", default = "default_wire_bottom_friction")]
    pub wire_bottom_friction: f32,
    /// Rolling resistance coefficient of obstacle contacts.
    #[serde(rename = "SpinFriction", default = "default_spin_friction")]
    pub spin_friction: f32,
}

fn default_grain_radius() -> f32 {
    DEFAULT_GRAIN_RADIUS_MM
}
fn default_grain_density() -> f32 {
    DEFAULT_GRAIN_DENSITY
}
fn default_grain_shear_modulus() -> f32 {
    DEFAULT_GRAIN_SHEAR_MODULUS_MPA
}
fn default_grain_poisson_ratio() -> f32 {
    DEFAULT_GRAIN_POISSON_RATIO
}
fn default_gravity() -> f32 {
    DEFAULT_GRAVITY
}
fn default_target_gravity() -> f32 {
    DEFAULT_TARGET_GRAVITY
}
fn default_vertical_speed() -> f32 {
    DEFAULT_VERTICAL_SPEED
}
fn default_linear_speed() -> f32 {
    DEFAULT_LINEAR_SPEED
}
fn default_enabled() -> bool {
    true
}
fn default_normal_damping() -> f32 {
    DEFAULT_NORMAL_DAMPING_RATE
}
fn default_strain_limit() -> f32 {
    DEFAULT_STRAIN_LIMIT
}
fn default_settle_energy() -> f32 {
    DEFAULT_SETTLE_ENERGY
}
fn default_membrane_viscosity() -> f32 {
    DEFAULT_MEMBRANE_VISCOSITY
}
fn default_grain_grain_friction() -> f32 {
    FRICTION_GRAIN_GRAIN
}
fn default_grain_obstacle_friction() -> f32 {
    FRICTION_GRAIN_OBSTACLE
}
fn default_grain_membrane_friction() -> f32 {
    FRICTION_GRAIN_MEMBRANE
}
fn default_grain_wire_friction() -> f32 {
    FRICTION_GRAIN_WIRE
}
fn default_wire_bottom_friction() -> f32 {
    FRICTION_WIRE_BOTTOM
}
fn default_spin_friction() -> f32 {
    DEFAULT_SPIN_FRICTION
}

/// Accepts `true`/`false`, numbers (non-zero is true) and their string forms.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(flag),
        Value::Number(number) => Ok(number.as_f64().is_some_and(|v| v != 0.0)),
        Value::String(text) => match text.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid flag '{other}'"))),
        },
        other => Err(serde::de::Error::custom(format!("invalid flag {other}"))),
    }
}

impl Parameters {
    /// Parses a JSON object. Unknown keys are ignored.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds parameters from `key=value` pairs, e.g. the components of a
    /// comma separated run id such as `Pressure=80000,Radius=20,...`.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = Map::new();
        for (key, value) in pairs {
            map.insert(key.trim().to_owned(), scalar_value(value.trim()));
        }
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    /// Parses a `key=value,key=value` string.
    pub fn parse(text: &str) -> Result<Self> {
        let mut pairs = Vec::new();
        for item in text.split(',').filter(|item| !item.trim().is_empty()) {
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| DemError::Config(format!("expected key=value, got '{item}'")))?;
            pairs.push((key, value));
        }
        Self::from_pairs(pairs)
    }
}

fn scalar_value(text: &str) -> Value {
    if let Ok(integer) = text.parse::<i64>() {
        return Value::from(integer);
    }
    if let Ok(float) = text.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(text.to_owned()),
    }
}

/// Dynamic friction coefficient targets, one per interaction type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrictionTargets {
    pub grain_obstacle: f32,
    pub grain_membrane: f32,
    pub grain_grain: f32,
    pub grain_wire: f32,
    pub wire_bottom: f32,
}

impl Default for FrictionTargets {
    fn default() -> Self {
        Self {
            grain_obstacle: FRICTION_GRAIN_OBSTACLE,
            grain_membrane: FRICTION_GRAIN_MEMBRANE,
            grain_grain: FRICTION_GRAIN_GRAIN,
            grain_wire: FRICTION_GRAIN_WIRE,
            wire_bottom: FRICTION_WIRE_BOTTOM,
        }
    }
}

impl FrictionTargets {
    fn iter(&self) -> impl Iterator<Item = f32> {
        [
            self.grain_obstacle,
            self.grain_membrane,
            self.grain_grain,
            self.grain_wire,
            self.wire_bottom,
        ]
        .into_iter()
    }
}

/// Validated configuration in SI units.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub dt: f32,
    /// Cylinder (membrane or side wall) radius.
    pub radius: f32,
    /// Specimen height, also the initial top plate position.
    pub height: f32,
    /// Radius of the disk grains and wire are poured within.
    pub pattern_radius: f32,
    pub pattern: Pattern,
    pub vertical_speed: f32,
    pub linear_speed: f32,
    pub target_pressure: f32,
    pub pressure_rate: f32,
    pub plate_speed: f32,
    pub gravity: f32,
    pub target_gravity: f32,
    pub normal_damping_rate: f32,
    pub use_membrane: bool,
    pub generate_grains: bool,
    pub seed: u64,
    pub target_grain_count: usize,
    pub wire_capacity: usize,
    pub grain: GrainProperties,
    pub wire: WireProperties,
    pub membrane: MembraneProperties,
    pub obstacle: Material,
    pub friction: FrictionTargets,
    pub static_friction: StaticFriction,
    pub spin_friction: f32,
    pub settle_energy: f32,
    pub strain_limit: f32,
    pub sample_interval: f32,
    pub membrane_viscosity: f32,
}

impl SimulationConfig {
    /// Converts and validates raw parameters.
    pub fn from_parameters(p: &Parameters) -> Result<Self> {
        let dt = p.time_step;
        require(dt.is_finite() && dt > 0.0, "TimeStep must be positive")?;
        require(
            p.grain_radius.is_finite() && p.grain_radius > 0.0,
            "grainRadius must be positive",
        )?;
        let grain_radius = p.grain_radius * MM;
        let radius = p.radius * MM;
        require(
            radius.is_finite() && radius > 4.0 * grain_radius,
            "Radius must exceed four grain radii",
        )?;
        require(p.pressure.is_finite() && p.pressure >= 0.0, "Pressure must be non-negative")?;
        require(p.plate_speed.is_finite() && p.plate_speed > 0.0, "Speed must be positive")?;
        require(p.grain_density > 0.0, "grainDensity must be positive")?;
        require(p.grain_shear_modulus > 0.0, "grainShearModulus must be positive")?;
        require(
            (0.0..0.5).contains(&p.grain_poisson_ratio),
            "grainPoissonRatio must lie in [0, 0.5)",
        )?;
        require(p.vertical_speed > 0.0, "verticalSpeed must be positive")?;
        require(p.linear_speed > 0.0, "linearSpeed must be positive")?;
        require(p.strain_limit > 0.0 && p.strain_limit < 1.0, "StrainLimit must lie in (0, 1)")?;
        require(
            (0.0..=1.0).contains(&p.membrane_viscosity),
            "MembraneViscosity must lie in [0, 1]",
        )?;
        require(
            p.static_friction_length >= 0.0
                && p.static_friction_speed >= 0.0
                && p.static_friction_stiffness >= 0.0
                && p.static_friction_damping >= 0.0,
            "static friction parameters must be non-negative",
        )?;
        let friction = FrictionTargets {
            grain_obstacle: p.grain_obstacle_friction,
            grain_membrane: p.grain_membrane_friction,
            grain_grain: p.grain_grain_friction,
            grain_wire: p.grain_wire_friction,
            wire_bottom: p.wire_bottom_friction,
        };
        require(
            friction.iter().all(|mu| mu.is_finite() && mu >= 0.0)
                && p.spin_friction.is_finite()
                && p.spin_friction >= 0.0,
            "friction coefficients must be non-negative",
        )?;

        let elastic_modulus =
            2.0 * p.grain_shear_modulus * MPA * (1.0 + p.grain_poisson_ratio);
        let grain = GrainProperties::new(
            grain_radius,
            p.grain_density,
            elastic_modulus,
            p.grain_poisson_ratio,
        );
        let wire = WireProperties::new(
            grain_radius / 2.0,
            grain_radius,
            WIRE_DENSITY,
            WIRE_ELASTIC_MODULUS,
        );
        let height = 2.0 * radius;
        let membrane = MembraneProperties::new(
            radius,
            height,
            grain_radius,
            MEMBRANE_THICKNESS,
            MEMBRANE_DENSITY,
            MEMBRANE_ELASTIC_MODULUS,
            MEMBRANE_POISSON_RATIO,
        );
        let obstacle = Material::obstacle(elastic_modulus, p.grain_poisson_ratio);

        let target_grain_count = target_grain_count(radius, grain_radius);
        let pour_time = height / p.vertical_speed;
        let wire_capacity = match p.pattern {
            Pattern::None => 0,
            _ => (p.linear_speed * pour_time / wire.internode_length).ceil() as usize * 2 + 16,
        };

        let target_pressure = p.pressure;
        let pressure_rate = p
            .pressure_rate
            .unwrap_or(target_pressure / DEFAULT_PRESSURE_RAMP_TIME);
        require(
            target_pressure == 0.0 || pressure_rate > 0.0,
            "PressureRate must be positive",
        )?;
        let sample_interval = p
            .sample_interval
            .unwrap_or(DEFAULT_SAMPLE_STEPS as f32 * dt);
        require(sample_interval > 0.0, "SampleInterval must be positive")?;

        Ok(Self {
            dt,
            radius,
            height,
            pattern_radius: radius - grain_radius,
            pattern: p.pattern,
            vertical_speed: p.vertical_speed,
            linear_speed: p.linear_speed,
            target_pressure,
            pressure_rate,
            plate_speed: p.plate_speed * MM,
            gravity: p.gravity,
            target_gravity: p.target_gravity,
            normal_damping_rate: p.normal_damping,
            use_membrane: p.membrane,
            generate_grains: p.generate,
            seed: p.seed,
            target_grain_count,
            wire_capacity,
            grain,
            wire,
            membrane,
            obstacle,
            friction,
            static_friction: StaticFriction {
                speed: p.static_friction_speed * MM,
                length: p.static_friction_length,
                stiffness: p.static_friction_stiffness,
                damping: p.static_friction_damping,
            },
            spin_friction: p.spin_friction,
            settle_energy: p.settle_energy,
            strain_limit: p.strain_limit,
            sample_interval,
            membrane_viscosity: p.membrane_viscosity,
        })
    }

    /// Radius beyond which grains are reprojected when no membrane confines them.
    pub fn lattice_radius(&self) -> f32 {
        if self.use_membrane {
            self.radius + self.grain.radius
        } else {
            2.0 * self.radius
        }
    }
}

/// Number of grains poured into a cylinder of the given radius.
pub fn target_grain_count(radius: f32, grain_radius: f32) -> usize {
    let cylinder = 4.0 * PI * radius.powi(3);
    let grain = 4.0 / 3.0 * PI * grain_radius.powi(3);
    let count = cylinder / grain / (1.0 + PACKING_VOID_FACTOR) - 49.0;
    count.max(0.0) as usize
}

fn require(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(DemError::Config(message.to_owned()))
    }
}
