//! Triangulated cylindrical membrane.
//!
//! Nodes are stored row by row. Each row holds `width` owned nodes framed by
//! one repeated node on each side (`margin` = 1), so a node's left and right
//! neighbours are always at `index - 1` and `index + 1` without wrapping.
//! Odd rows are shifted by half a column, which makes every node the apex of
//! six triangles.

use std::f32::consts::PI;
use std::ops::Range;

use glam::Vec3;

use crate::core::soa::MassSoA;
use crate::core::types::MembraneProperties;
use crate::error::{EntityKind, Result};

#[derive(Debug, Clone)]
pub struct Membrane {
    pub nodes: MassSoA,
    pub properties: MembraneProperties,
    pub width: usize,
    pub rows: usize,
    pub margin: usize,
    pub stride: usize,
}

impl Membrane {
    pub fn new(properties: MembraneProperties) -> Result<Self> {
        let width = properties.width;
        let rows = properties.rows;
        let margin = 1;
        let stride = width + 2 * margin;
        let mut nodes = MassSoA::with_capacity(EntityKind::Membrane, rows * stride);
        let pitch = properties.row_pitch();
        for row in 0..rows {
            let z = row as f32 * pitch;
            for col in -1..=width as isize {
                let shift = (row % 2) as f32 / 2.0;
                let angle = 2.0 * PI * (col as f32 + shift) / width as f32;
                let position = Vec3::new(
                    properties.radius * angle.cos(),
                    properties.radius * angle.sin(),
                    z,
                );
                nodes.push(position, Vec3::ZERO)?;
            }
        }
        Ok(Self {
            nodes,
            properties,
            width,
            rows,
            margin,
            stride,
        })
    }

    /// Storage index of node (`row`, `col`), `col` in `-1..=width`.
    pub fn index(&self, row: usize, col: isize) -> usize {
        ((row * self.stride + self.margin) as isize + col) as usize
    }

    /// Owned (non repeated) node indices of `row`.
    pub fn row(&self, row: usize) -> Range<usize> {
        let start = row * self.stride + self.margin;
        start..start + self.width
    }

    /// Every owned node index.
    pub fn owned(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.rows).flat_map(move |row| self.row(row))
    }

    /// Offsets from a node of `row` to its two neighbours in the previous
    /// row and its left neighbour, in counter-clockwise order.
    pub fn edge_offsets(&self, row: usize) -> [isize; 3] {
        let stride = self.stride as isize;
        let odd = (row % 2) as isize;
        [-stride + odd, -stride - (1 - odd), -1]
    }

    /// Moves forces accumulated on repeated nodes onto their owners.
    pub fn fold_repeated_forces(&mut self) {
        let w = self.width as isize;
        for row in 0..self.rows {
            let (first, last) = (self.index(row, 0), self.index(row, w - 1));
            let (left, right) = (self.index(row, -1), self.index(row, w));
            let forces = &mut self.nodes.forces;
            let (from_right, from_left) = (forces[right], forces[left]);
            forces[first] += from_right;
            forces[last] += from_left;
            forces[right] = Vec3::ZERO;
            forces[left] = Vec3::ZERO;
        }
    }

    /// Copies owner position and velocity onto the repeated nodes.
    pub fn sync_repeated(&mut self) {
        let w = self.width as isize;
        for row in 0..self.rows {
            let (first, last) = (self.index(row, 0), self.index(row, w - 1));
            let (left, right) = (self.index(row, -1), self.index(row, w));
            let nodes = &mut self.nodes;
            nodes.positions[left] = nodes.positions[last];
            nodes.positions[right] = nodes.positions[first];
            nodes.velocities[left] = nodes.velocities[last];
            nodes.velocities[right] = nodes.velocities[first];
        }
    }

    /// Pins the bottom and top rows to the plates.
    pub fn follow_plates(&mut self, bottom_z: f32, bottom_speed: f32, top_z: f32, top_speed: f32) {
        for (row, z, speed) in [(0, bottom_z, bottom_speed), (self.rows - 1, top_z, top_speed)] {
            for index in self.index(row, -1)..=self.index(row, self.width as isize) {
                self.nodes.positions[index].z = z;
                self.nodes.velocities[index] = Vec3::new(0.0, 0.0, speed);
            }
        }
    }

    /// Node pairs of every triangle edge, each listed once.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (1..self.rows).flat_map(move |row| {
            let offsets = self.edge_offsets(row);
            self.row(row).flat_map(move |v| {
                offsets
                    .into_iter()
                    .map(move |offset| (v, (v as isize + offset) as usize))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membrane() -> Membrane {
        let props = MembraneProperties::new(0.02, 0.04, 2.5e-3, 3e-4, 1e3, 1.5e6, 0.48);
        Membrane::new(props).expect("membrane fits its own capacity")
    }

    #[test]
    fn repeated_nodes_mirror_owners() {
        let membrane = membrane();
        let w = membrane.width as isize;
        for row in 0..membrane.rows {
            let left = membrane.nodes.position(membrane.index(row, -1));
            let last = membrane.nodes.position(membrane.index(row, w - 1));
            assert!(left.distance(last) < 1e-6, "row {row}: {left:?} vs {last:?}");
        }
    }

    #[test]
    fn folding_moves_forces_to_owners() {
        let mut membrane = membrane();
        let w = membrane.width as isize;
        let right = membrane.index(1, w);
        membrane.nodes.forces[right] = Vec3::X;
        membrane.fold_repeated_forces();
        assert_eq!(membrane.nodes.forces[membrane.index(1, 0)], Vec3::X);
        assert_eq!(membrane.nodes.forces[right], Vec3::ZERO);
    }

    #[test]
    fn edge_neighbours_are_close() {
        let membrane = membrane();
        let limit = 1.5 * membrane.properties.internode_length;
        for (a, b) in membrane.edges() {
            let length = membrane.nodes.position(a).distance(membrane.nodes.position(b));
            assert!(length < limit, "edge {a}-{b} is {length}");
        }
    }
}
