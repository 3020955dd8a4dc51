use std::ops::Range;

use glam::Quat;

use crate::core::{GrainProperties, GrainSoA, MassSoA, Membrane};
use crate::dynamics::parallel::{for_each_zip3, max_length};
use crate::utils::math::integrate_rotation;

/// Semi-implicit Euler integrator for grains, wire and membrane nodes.
///
/// Each `integrate_*` call returns the largest speed after the update, which
/// feeds the neighbor-list margins.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub dt: f32,
    parallel: bool,
}

impl Integrator {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            parallel: cfg!(feature = "parallel"),
        }
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled && cfg!(feature = "parallel");
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Steps grain translation and rotation. The orientation advances with the
    /// angular velocity of the previous step and is renormalised.
    pub fn integrate_grains(&self, grains: &mut GrainSoA, props: &GrainProperties) -> f32 {
        let dt = self.dt;
        let dt_mass = dt / props.mass;
        let dt_angular_mass = dt / props.angular_mass;
        let GrainSoA {
            mass,
            rotations,
            angular_velocities,
            torques,
        } = grains;
        let MassSoA {
            positions,
            velocities,
            forces,
            ..
        } = mass;

        for_each_zip3(positions, velocities, forces.as_slice(), self.parallel, |p, v, f| {
            *v += dt_mass * *f;
            *p += dt * *v;
        });
        for_each_zip3(rotations, angular_velocities, torques.as_slice(), self.parallel, |q: &mut Quat, w, t| {
            *q = integrate_rotation(*q, *w, dt);
            *w += dt_angular_mass * *t;
            *q = q.normalize();
        });
        max_length(velocities, self.parallel)
    }

    /// Steps the nodes in `range` with a uniform mass:
    /// v += dt/m·F, v *= viscosity, x += dt·v.
    pub fn integrate_nodes(&self, nodes: &mut MassSoA, node_mass: f32, range: Range<usize>, viscosity: f32) -> f32 {
        let dt = self.dt;
        let dt_mass = dt / node_mass;
        let range = range.start.min(nodes.len())..range.end.min(nodes.len());
        let positions = &mut nodes.positions[range.clone()];
        let velocities = &mut nodes.velocities[range.clone()];
        let forces = &nodes.forces[range];
        for_each_zip3(positions, velocities, forces, self.parallel, |p, v, f| {
            *v += dt_mass * *f;
            *v *= viscosity;
            *p += dt * *v;
        });
        max_length(velocities, self.parallel)
    }

    /// Steps the membrane rows between the two plate-bound rows.
    ///
    /// Forces on repeated nodes are folded into their owners first and the
    /// repeated nodes are refreshed afterwards.
    pub fn integrate_membrane(&self, membrane: &mut Membrane, viscosity: f32) -> f32 {
        if membrane.rows < 3 {
            return 0.0;
        }
        membrane.fold_repeated_forces();
        let first = membrane.index(1, -1);
        let last = membrane.index(membrane.rows - 2, membrane.width as isize);
        let mass = membrane.properties.node_mass;
        let speed = self.integrate_nodes(&mut membrane.nodes, mass, first..last + 1, viscosity);
        membrane.sync_repeated();
        speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityKind;
    use glam::Vec3;

    #[test]
    fn constant_force_accelerates_uniformly() {
        let integrator = Integrator::new(0.1);
        let mut nodes = MassSoA::with_capacity(EntityKind::Wire, 1);
        nodes.push(Vec3::ZERO, Vec3::ZERO).unwrap();
        nodes.forces[0] = Vec3::X;
        let speed = integrator.integrate_nodes(&mut nodes, 2.0, 0..1, 1.0);
        assert!((speed - 0.05).abs() < 1e-6);
        // semi-implicit: position uses the updated velocity
        assert!((nodes.positions[0].x - 0.005).abs() < 1e-7);
    }

    #[test]
    fn viscosity_damps_velocity() {
        let integrator = Integrator::new(0.1);
        let mut nodes = MassSoA::with_capacity(EntityKind::Membrane, 1);
        nodes.push(Vec3::ZERO, Vec3::X).unwrap();
        integrator.integrate_nodes(&mut nodes, 1.0, 0..1, 0.5);
        assert!((nodes.velocities[0].x - 0.5).abs() < 1e-7);
    }

    #[test]
    fn spinning_grain_keeps_unit_quaternion() {
        let props = GrainProperties::new(2.5e-3, 7.8e3, 1.97e11, 0.28);
        let integrator = Integrator::new(1e-4);
        let mut grains = GrainSoA::with_capacity(1);
        grains.push(Vec3::ZERO, Vec3::ZERO, Quat::IDENTITY).unwrap();
        grains.angular_velocities[0] = Vec3::new(30.0, -10.0, 50.0);
        for _ in 0..1000 {
            integrator.integrate_grains(&mut grains, &props);
            assert!((grains.rotations[0].length() - 1.0).abs() < 1e-5);
        }
    }
}
