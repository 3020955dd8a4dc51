//! Load results and textual snapshots.

use std::f32::consts::PI;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

use crate::core::MeanLoads;
use crate::error::Result;

pub const RESULTS_HEADER: &str = "Strain (%), Radial (Pa), Axial (Pa), Normalized deviator stress";

/// One row of the load curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSample {
    /// Axial strain as a fraction.
    pub strain: f32,
    pub radial: f32,
    pub axial: f32,
    /// Deviator stress over the radial stress, `(axial - radial) / radial`.
    pub deviatoric: f32,
}

impl LoadSample {
    /// Converts mean boundary loads into stresses on a cylinder of `radius`
    /// and current `height`.
    pub fn from_loads(strain: f32, loads: &MeanLoads, radius: f32, height: f32) -> Self {
        let axial = (loads.top + loads.bottom) / (2.0 * PI * radius * radius);
        let radial = loads.radial / (2.0 * PI * radius * height);
        let deviatoric = if radial == 0.0 { 0.0 } else { (axial - radial) / radial };
        Self {
            strain,
            radial,
            axial,
            deviatoric,
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {}",
            self.strain * 100.0,
            self.radial,
            self.axial,
            self.deviatoric
        )
    }
}

/// Void ratio of a grain assembly filling a cylinder.
pub fn void_ratio(grain_count: usize, grain_radius: f32, radius: f32, height: f32) -> f32 {
    let solid = grain_count as f32 * 4.0 / 3.0 * PI * grain_radius.powi(3);
    if solid == 0.0 {
        return 0.0;
    }
    let total = PI * radius * radius * height;
    (total - solid) / solid
}

/// Thread-safe destination for result lines, shareable between a running
/// simulation and its owner.
#[derive(Clone)]
pub struct ResultSink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl ResultSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }

    pub fn write_line(&self, line: &str) -> Result<()> {
        let mut writer = self.inner.lock();
        writeln!(writer, "{line}")?;
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.inner.lock().flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSink").finish_non_exhaustive()
    }
}

/// Collects load samples and streams them to an optional sink.
#[derive(Debug, Default)]
pub struct LoadRecorder {
    samples: Vec<LoadSample>,
    sink: Option<ResultSink>,
    header_written: bool,
}

impl LoadRecorder {
    pub fn set_sink(&mut self, sink: ResultSink) {
        self.sink = Some(sink);
        self.header_written = false;
    }

    pub fn samples(&self) -> &[LoadSample] {
        &self.samples
    }

    /// Writes the version and void ratio line followed by the column header.
    pub fn begin(&mut self, void_ratio: f32) -> Result<()> {
        if let Some(sink) = &self.sink {
            if !self.header_written {
                sink.write_line(&format!(
                    "version:{},voidRatio:{void_ratio}",
                    env!("CARGO_PKG_VERSION")
                ))?;
                sink.write_line(RESULTS_HEADER)?;
                self.header_written = true;
            }
        }
        Ok(())
    }

    pub fn record(&mut self, sample: LoadSample) -> Result<()> {
        self.samples.push(sample);
        if let Some(sink) = &self.sink {
            sink.write_line(&sample.to_line())?;
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        match &self.sink {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

/// A point with its contact count and stored elastic energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotPoint {
    pub position: Vec3,
    pub contacts: u32,
    pub energy: f32,
}

/// A force between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotForce {
    pub a: Vec3,
    pub b: Vec3,
    pub force: Vec3,
}

/// Full snapshot content, assembled by the simulation.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub grain_radius: f32,
    pub wire_radius: f32,
    pub grains: Vec<SnapshotPoint>,
    pub wire: Vec<SnapshotPoint>,
    pub side: Vec<(Vec3, Vec3)>,
    pub grain_grain: Vec<SnapshotForce>,
    pub grain_side: Vec<SnapshotForce>,
    pub grain_wire: Vec<SnapshotForce>,
    pub wire_wire: Vec<SnapshotForce>,
}

impl Snapshot {
    /// Writes `<base>.grain`, `<base>.wire`, `<base>.side` and the contact
    /// files next to each other.
    pub fn write(&self, base: &Path) -> Result<()> {
        write_points(&with_suffix(base, "grain"), self.grain_radius, &self.grains)?;
        write_points(&with_suffix(base, "wire"), self.wire_radius, &self.wire)?;

        let mut side = BufWriter::new(File::create(with_suffix(base, "side"))?);
        for (a, b) in &self.side {
            writeln!(side, "{} {} {} {} {} {}", a.x, a.y, a.z, b.x, b.y, b.z)?;
        }
        side.flush()?;

        write_forces(&with_suffix(base, "grain-grain"), &self.grain_grain)?;
        write_forces(&with_suffix(base, "grain-side"), &self.grain_side)?;
        write_forces(&with_suffix(base, "grain-wire"), &self.grain_wire)?;
        write_forces(&with_suffix(base, "wire-wire"), &self.wire_wire)?;
        Ok(())
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn write_points(path: &Path, radius: f32, points: &[SnapshotPoint]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{radius}")?;
    writeln!(out, "x y z contacts energy")?;
    for point in points {
        let p = point.position;
        writeln!(out, "{} {} {} {} {}", p.x, p.y, p.z, point.contacts, point.energy)?;
    }
    out.flush()?;
    Ok(())
}

fn write_forces(path: &Path, forces: &[SnapshotForce]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for SnapshotForce { a, b, force } in forces {
        writeln!(
            out,
            "{} {} {} {} {} {} {} {} {}",
            a.x, a.y, a.z, b.x, b.y, b.z, force.x, force.y, force.z
        )?;
    }
    out.flush()?;
    Ok(())
}
