//! Flexible wire modelled as a chain of point masses.

use glam::Vec3;

use crate::core::soa::MassSoA;
use crate::core::types::WireProperties;
use crate::error::{EntityKind, Result};

/// Ordered chain of nodes; node `i` is linked to `i - 1` and `i + 1`.
///
/// The chain only grows, by appending at its free end while pouring.
#[derive(Debug, Clone)]
pub struct Wire {
    pub nodes: MassSoA,
    pub properties: WireProperties,
}

impl Wire {
    pub fn new(properties: WireProperties, capacity: usize) -> Self {
        Self {
            nodes: MassSoA::with_capacity(EntityKind::Wire, capacity),
            properties,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn last_position(&self) -> Option<Vec3> {
        self.nodes.positions.last().copied()
    }

    pub fn push_node(&mut self, position: Vec3) -> Result<usize> {
        self.nodes.push(position, Vec3::ZERO)
    }

    /// Spring-damper force exerted on node `i` by the segment to `i + 1`.
    ///
    /// Returns zero for a collapsed segment.
    pub fn segment_tension(&self, i: usize) -> Vec3 {
        let props = &self.properties;
        let relative = self.nodes.positions[i] - self.nodes.positions[i + 1];
        let length = relative.length();
        if length == 0.0 {
            return Vec3::ZERO;
        }
        let normal = relative / length;
        let stretch = -props.tension_stiffness * (length - props.internode_length);
        let relative_velocity = self.nodes.velocities[i] - self.nodes.velocities[i + 1];
        let damping = -props.tension_damping * normal.dot(relative_velocity);
        (stretch + damping) * normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire() -> Wire {
        Wire::new(WireProperties::new(1.25e-3, 2.5e-3, 1e3, 1e8), 8)
    }

    #[test]
    fn stretched_segment_pulls_nodes_together() {
        let mut wire = wire();
        wire.push_node(Vec3::ZERO).unwrap();
        wire.push_node(Vec3::new(3e-3, 0.0, 0.0)).unwrap();
        let force = wire.segment_tension(0);
        assert!(force.x > 0.0, "node 0 should be pulled toward node 1: {force:?}");
        assert!(force.y.abs() < 1e-9 && force.z.abs() < 1e-9);
    }

    #[test]
    fn rest_length_segment_is_unloaded() {
        let mut wire = wire();
        wire.push_node(Vec3::ZERO).unwrap();
        wire.push_node(Vec3::new(0.0, 2.5e-3, 0.0)).unwrap();
        assert!(wire.segment_tension(0).length() < 1e-6);
    }
}
