use glam::{Quat, Vec3};

use crate::error::{DemError, EntityKind, Result};

/// Structure-of-Arrays storage for point masses (wire and membrane nodes).
///
/// Capacity is reserved up front and never grows, so indices handed out by
/// [`MassSoA::push`] stay valid for the whole run.
#[derive(Debug, Clone)]
pub struct MassSoA {
    kind: EntityKind,
    capacity: usize,
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
    pub forces: Vec<Vec3>,
}

impl MassSoA {
    pub fn with_capacity(kind: EntityKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            positions: Vec::with_capacity(capacity),
            velocities: Vec::with_capacity(capacity),
            forces: Vec::with_capacity(capacity),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Appends a node at rest and returns its index.
    pub fn push(&mut self, position: Vec3, velocity: Vec3) -> Result<usize> {
        if self.len() >= self.capacity {
            return Err(DemError::Capacity {
                kind: self.kind,
                capacity: self.capacity,
            });
        }
        self.positions.push(position);
        self.velocities.push(velocity);
        self.forces.push(Vec3::ZERO);
        Ok(self.len() - 1)
    }

    pub fn position(&self, index: usize) -> Vec3 {
        self.positions[index]
    }

    pub fn velocity(&self, index: usize) -> Vec3 {
        self.velocities[index]
    }

    pub fn clear_forces(&mut self) {
        self.forces.fill(Vec3::ZERO);
    }

    /// Seeds every force with the weight `mass·g` pointing down.
    pub fn seed_gravity(&mut self, mass: f32, gravity: f32) {
        self.forces.fill(Vec3::new(0.0, 0.0, -mass * gravity));
    }

    pub fn max_speed(&self) -> f32 {
        self.velocities
            .iter()
            .map(|v| v.length())
            .fold(0.0, f32::max)
    }

    /// Fails on the first node whose position, velocity or force is not finite.
    pub fn check_finite(&self) -> Result<()> {
        check_finite(self.kind, "position", &self.positions)?;
        check_finite(self.kind, "velocity", &self.velocities)?;
        check_finite(self.kind, "force", &self.forces)
    }
}

pub(crate) fn check_finite(kind: EntityKind, quantity: &'static str, values: &[Vec3]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(DemError::NonFinite {
            kind,
            index,
            quantity,
        }),
        None => Ok(()),
    }
}

/// Grain store: point mass state plus orientation, spin and torque.
#[derive(Debug, Clone)]
pub struct GrainSoA {
    pub mass: MassSoA,
    pub rotations: Vec<Quat>,
    pub angular_velocities: Vec<Vec3>,
    pub torques: Vec<Vec3>,
}

impl GrainSoA {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mass: MassSoA::with_capacity(EntityKind::Grain, capacity),
            rotations: Vec::with_capacity(capacity),
            angular_velocities: Vec::with_capacity(capacity),
            torques: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.mass.capacity()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.mass.positions
    }

    pub fn push(&mut self, position: Vec3, velocity: Vec3, rotation: Quat) -> Result<usize> {
        let index = self.mass.push(position, velocity)?;
        self.rotations.push(rotation.normalize());
        self.angular_velocities.push(Vec3::ZERO);
        self.torques.push(Vec3::ZERO);
        Ok(index)
    }

    pub fn get(&self, index: usize) -> Option<GrainRef<'_>> {
        (index < self.len()).then_some(GrainRef { soa: self, index })
    }

    pub fn clear_forces(&mut self) {
        self.mass.clear_forces();
        self.torques.fill(Vec3::ZERO);
    }

    /// Translational plus rotational kinetic energy.
    pub fn kinetic_energy(&self, mass: f32, angular_mass: f32) -> f32 {
        let linear: f32 = self.mass.velocities.iter().map(|v| v.length_squared()).sum();
        let angular: f32 = self.angular_velocities.iter().map(|w| w.length_squared()).sum();
        0.5 * mass * linear + 0.5 * angular_mass * angular
    }

    pub fn check_finite(&self) -> Result<()> {
        self.mass.check_finite()?;
        check_finite(EntityKind::Grain, "angular velocity", &self.angular_velocities)?;
        check_finite(EntityKind::Grain, "torque", &self.torques)?;
        match self.rotations.iter().position(|q| !q.is_finite()) {
            Some(index) => Err(DemError::NonFinite {
                kind: EntityKind::Grain,
                index,
                quantity: "rotation",
            }),
            None => Ok(()),
        }
    }
}

/// Read-only view of one grain.
#[derive(Clone, Copy)]
pub struct GrainRef<'a> {
    soa: &'a GrainSoA,
    index: usize,
}

impl<'a> GrainRef<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Vec3 {
        self.soa.mass.positions[self.index]
    }

    pub fn velocity(&self) -> Vec3 {
        self.soa.mass.velocities[self.index]
    }

    pub fn force(&self) -> Vec3 {
        self.soa.mass.forces[self.index]
    }

    pub fn rotation(&self) -> Quat {
        self.soa.rotations[self.index]
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.soa.angular_velocities[self.index]
    }

    pub fn torque(&self) -> Vec3 {
        self.soa.torques[self.index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_past_capacity_fails() {
        let mut grains = GrainSoA::with_capacity(1);
        grains
            .push(Vec3::ZERO, Vec3::ZERO, Quat::IDENTITY)
            .expect("first grain fits");
        let err = grains
            .push(Vec3::X, Vec3::ZERO, Quat::IDENTITY)
            .unwrap_err();
        assert!(matches!(
            err,
            DemError::Capacity {
                kind: EntityKind::Grain,
                capacity: 1
            }
        ));
    }

    #[test]
    fn clear_forces_zeroes_torque() {
        let mut grains = GrainSoA::with_capacity(2);
        grains.push(Vec3::ZERO, Vec3::ZERO, Quat::IDENTITY).unwrap();
        grains.mass.forces[0] = Vec3::ONE;
        grains.torques[0] = Vec3::ONE;
        grains.clear_forces();
        let grain = grains.get(0).unwrap();
        assert_eq!(grain.force(), Vec3::ZERO);
        assert_eq!(grain.torque(), Vec3::ZERO);
    }

    #[test]
    fn non_finite_velocity_is_reported_with_index() {
        let mut nodes = MassSoA::with_capacity(EntityKind::Wire, 4);
        nodes.push(Vec3::ZERO, Vec3::ZERO).unwrap();
        nodes.push(Vec3::X, Vec3::new(f32::NAN, 0.0, 0.0)).unwrap();
        match nodes.check_finite() {
            Err(DemError::NonFinite { kind, index, quantity }) => {
                assert_eq!(kind, EntityKind::Wire);
                assert_eq!(index, 1);
                assert_eq!(quantity, "velocity");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
