use glam::Vec3;

use crate::error::{DemError, EntityKind, Result};

/// Horizontal rigid plane. Plates translate along z only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plate {
    pub z: f32,
    /// Vertical velocity, positive up.
    pub velocity: f32,
    /// Compressive load received from grains this step.
    pub force: f32,
}

impl Plate {
    pub fn at(z: f32) -> Self {
        Self {
            z,
            ..Self::default()
        }
    }

    pub fn velocity3(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.velocity)
    }
}

/// Bottom and top plates of the triaxial cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Plates {
    pub bottom: Plate,
    pub top: Plate,
    /// Mass of the top plate while it is pressure driven.
    pub mass: f32,
    /// Loaded area, π·r².
    pub area: f32,
}

impl Plates {
    pub fn new(height: f32, radius: f32) -> Self {
        Self {
            bottom: Plate::at(0.0),
            top: Plate::at(height),
            mass: 0.0,
            area: std::f32::consts::PI * radius * radius,
        }
    }

    pub fn height(&self) -> f32 {
        self.top.z - self.bottom.z
    }

    pub fn clear_forces(&mut self) {
        self.bottom.force = 0.0;
        self.top.force = 0.0;
    }

    /// Advances the top plate under the confining pressure and the grain
    /// load. The plate may descend but never rises.
    pub fn press(&mut self, pressure: f32, dt: f32) {
        if self.mass <= 0.0 {
            return;
        }
        let net = self.top.force - pressure * self.area;
        self.top.velocity = (self.top.velocity + dt / self.mass * net).min(0.0);
        self.top.z += dt * self.top.velocity;
        self.bottom.velocity = 0.0;
    }

    /// Moves both plates toward each other at `speed`.
    pub fn close(&mut self, speed: f32, dt: f32) {
        self.top.velocity = -speed;
        self.bottom.velocity = speed;
        self.top.z += dt * self.top.velocity;
        self.bottom.z += dt * self.bottom.velocity;
    }

    pub fn stop(&mut self) {
        self.top.velocity = 0.0;
        self.bottom.velocity = 0.0;
    }

    pub fn check_finite(&self) -> Result<()> {
        for (index, plate) in [self.bottom, self.top].iter().enumerate() {
            if !(plate.z.is_finite() && plate.velocity.is_finite() && plate.force.is_finite()) {
                return Err(DemError::NonFinite {
                    kind: EntityKind::Plate,
                    index,
                    quantity: "state",
                });
            }
        }
        Ok(())
    }
}

/// Running sums of boundary loads between two load samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadAccumulator {
    top: f32,
    bottom: f32,
    radial: f32,
    steps: u32,
}

/// Mean boundary loads over a sampling interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanLoads {
    pub top: f32,
    pub bottom: f32,
    pub radial: f32,
}

impl LoadAccumulator {
    pub fn add(&mut self, plates: &Plates, radial: f32) {
        self.top += plates.top.force;
        self.bottom += plates.bottom.force;
        self.radial += radial;
        self.steps += 1;
    }

    /// Returns the means and restarts accumulation.
    pub fn take(&mut self) -> Option<MeanLoads> {
        let sums = std::mem::take(self);
        if sums.steps == 0 {
            return None;
        }
        let n = sums.steps as f32;
        Some(MeanLoads {
            top: sums.top / n,
            bottom: sums.bottom / n,
            radial: sums.radial / n,
        })
    }
}
