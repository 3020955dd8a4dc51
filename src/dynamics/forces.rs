use glam::Vec3;

use crate::core::{GrainSoA, MassSoA, Membrane, Wire};

/// Internal or body force accumulated into a store before contacts.
pub trait ForceGenerator<T: ?Sized>: Send + Sync {
    fn apply(&self, target: &mut T);
}

/// Uniform downward gravity. Seeding overwrites previous forces.
#[derive(Debug, Clone, Copy)]
pub struct Gravity {
    pub mass: f32,
    /// Acceleration magnitude (N/kg), pointing down.
    pub gravity: f32,
}

impl ForceGenerator<MassSoA> for Gravity {
    fn apply(&self, nodes: &mut MassSoA) {
        nodes.seed_gravity(self.mass, self.gravity);
    }
}

impl ForceGenerator<GrainSoA> for Gravity {
    fn apply(&self, grains: &mut GrainSoA) {
        grains.clear_forces();
        grains.mass.seed_gravity(self.mass, self.gravity);
    }
}

/// Axial spring-damper between consecutive wire nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireTension;

impl ForceGenerator<Wire> for WireTension {
    fn apply(&self, wire: &mut Wire) {
        for i in 0..wire.len().saturating_sub(1) {
            let force = wire.segment_tension(i);
            wire.nodes.forces[i] += force;
            wire.nodes.forces[i + 1] -= force;
        }
    }
}

/// Resistance of the wire to bending at each interior node, with damping of
/// the bending rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireBending;

impl ForceGenerator<Wire> for WireBending {
    fn apply(&self, wire: &mut Wire) {
        let props = wire.properties;
        if props.bend_stiffness == 0.0 || wire.len() < 3 {
            return;
        }
        for i in 1..wire.len() - 1 {
            let p = &wire.nodes.positions;
            let (a, b) = (p[i + 1] - p[i], p[i] - p[i - 1]);
            let c = a.cross(b);
            let length = c.length();
            if length == 0.0 {
                continue;
            }
            let angle = length.atan2(a.dot(b));
            let moment = props.bend_stiffness * angle;
            let dap = a.cross(c) / (a.length() * length);
            let dbp = b.cross(c) / (b.length() * length);
            let forces = &mut wire.nodes.forces;
            forces[i + 1] += moment * -dap;
            forces[i] += moment * (dap + dbp);
            forces[i - 1] += moment * -dbp;

            if props.bend_damping != 0.0 {
                let v = &wire.nodes.velocities;
                let (va, vb) = (v[i + 1] - v[i], v[i] - v[i - 1]);
                let axis = va.cross(vb);
                let rate_length = axis.length();
                if rate_length != 0.0 {
                    let rate = rate_length.atan2(va.dot(vb));
                    let across = v[i + 1] - v[i - 1];
                    forces[i] += (props.bend_damping * rate / 2.0 / rate_length) * axis.cross(across);
                }
            }
        }
    }
}

/// Membrane edge tension plus the confining pressure on each node.
#[derive(Debug, Clone, Copy)]
pub struct MembraneForces {
    pub pressure: f32,
}

impl ForceGenerator<Membrane> for MembraneForces {
    fn apply(&self, membrane: &mut Membrane) {
        let props = membrane.properties;
        // each triangle's pressure load goes to a single vertex
        let pressure_coefficient = self.pressure / 2.0;
        for row in 1..membrane.rows {
            let offsets = membrane.edge_offsets(row);
            for v in membrane.row(row) {
                let nodes = &mut membrane.nodes;
                let origin = nodes.positions[v];
                let origin_velocity = nodes.velocities[v];
                let mut arms = [Vec3::ZERO; 3];
                for (arm, offset) in arms.iter_mut().zip(offsets) {
                    let e = (v as isize + offset) as usize;
                    *arm = nodes.positions[e] - origin;
                    let length = arm.length();
                    if length == 0.0 {
                        continue;
                    }
                    let normal = *arm / length;
                    let stretch = props.tension_stiffness * (length - props.internode_length);
                    let damping =
                        props.tension_damping * normal.dot(nodes.velocities[e] - origin_velocity);
                    let tension = (stretch + damping) * normal;
                    nodes.forces[v] += tension;
                    nodes.forces[e] -= tension;
                }
                let [r0, r1, r2] = arms;
                nodes.forces[v] += pressure_coefficient * (r0.cross(r1) + r1.cross(r2));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MembraneProperties, WireProperties};

    fn wire(points: &[Vec3]) -> Wire {
        let mut wire = Wire::new(WireProperties::new(1.25e-3, 2.5e-3, 1e3, 1e8), 8);
        for &p in points {
            wire.push_node(p).unwrap();
        }
        wire
    }

    #[test]
    fn tension_conserves_momentum() {
        let mut wire = wire(&[Vec3::ZERO, Vec3::new(3e-3, 0.0, 0.0), Vec3::new(3e-3, 3e-3, 0.0)]);
        WireTension.apply(&mut wire);
        let total: Vec3 = wire.nodes.forces.iter().sum();
        assert!(total.length() < 1e-4, "net force {total:?}");
    }

    #[test]
    fn straight_wire_has_no_bending_load() {
        let step = Vec3::new(2.5e-3, 0.0, 0.0);
        let mut wire = wire(&[Vec3::ZERO, step, 2.0 * step]);
        WireBending.apply(&mut wire);
        assert!(wire.nodes.forces.iter().all(|f| *f == Vec3::ZERO));
    }

    #[test]
    fn bent_wire_is_pushed_straight() {
        let mut wire = wire(&[Vec3::ZERO, Vec3::new(2.5e-3, 1e-3, 0.0), Vec3::new(5e-3, 0.0, 0.0)]);
        WireBending.apply(&mut wire);
        assert!(wire.nodes.forces[1].y < 0.0, "{:?}", wire.nodes.forces[1]);
        let total: Vec3 = wire.nodes.forces.iter().sum();
        assert!(total.length() < 1e-6);
    }

    #[test]
    fn pressure_pushes_membrane_inward() {
        let props = MembraneProperties::new(0.02, 0.04, 2.5e-3, 3e-4, 1e3, 1.5e6, 0.48);
        let mut membrane = Membrane::new(props).unwrap();
        MembraneForces { pressure: 1e4 }.apply(&mut membrane);
        membrane.fold_repeated_forces();
        let row = membrane.rows / 2;
        for v in membrane.row(row) {
            let p = membrane.nodes.positions[v];
            let radial = Vec3::new(p.x, p.y, 0.0).normalize();
            assert!(membrane.nodes.forces[v].dot(radial) < 0.0, "node {v}");
        }
    }
}
