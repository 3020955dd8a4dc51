//! Dense single-occupant cell lattice for grain-grain neighbor search.
//!
//! Cells are `2R/√3` wide, so their diagonal equals one grain diameter and
//! two non-overlapping grain centers never share a cell. Pairs are found by
//! scanning a half stencil of 62 cells from every occupied cell, which visits
//! each unordered pair of cells once.

use glam::Vec3;

use crate::collision::bounds::Bounds;
use crate::error::{EntityKind, Result};

/// Guard cells on each side; the half stencil reaches two cells out.
const GUARD: usize = 2;

#[derive(Debug, Clone)]
pub struct Lattice {
    scale: f32,
    min: Vec3,
    size: [usize; 3],
    /// `index + 1` of the occupant, 0 when empty.
    cells: Vec<u32>,
    /// Elements whose cell was already taken.
    displaced: Vec<usize>,
}

impl Lattice {
    /// Indexes `positions` into a lattice of `scale` cells per meter whose
    /// box is recomputed from the current extents.
    pub fn build(kind: EntityKind, scale: f32, positions: &[Vec3], safety: &Bounds) -> Result<Self> {
        let bounds = Bounds::enclosing(kind, positions.iter().copied().enumerate(), safety)?
            .unwrap_or(Bounds::new(Vec3::ZERO, Vec3::ZERO));
        let size = bounds.cell_counts(kind, scale, GUARD)?;
        let mut lattice = Self {
            scale,
            min: bounds.min,
            size,
            cells: vec![0; size[0] * size[1] * size[2]],
            displaced: Vec::new(),
        };
        for (index, &p) in positions.iter().enumerate() {
            let cell = lattice.cell_of(p);
            if lattice.cells[cell] != 0 {
                lattice.displaced.push(index);
            } else {
                lattice.cells[cell] = index as u32 + 1;
            }
        }
        Ok(lattice)
    }

    /// Cell holding `p`; `p` must lie inside the indexed extents.
    pub fn cell_of(&self, p: Vec3) -> usize {
        let local = (p - self.min) * self.scale;
        let x = local.x as usize + GUARD;
        let y = local.y as usize + GUARD;
        let z = local.z as usize + GUARD;
        x + self.size[0] * (y + self.size[1] * z)
    }

    pub fn occupant(&self, cell: usize) -> Option<usize> {
        match self.cells.get(cell) {
            Some(&slot) if slot != 0 => Some(slot as usize - 1),
            _ => None,
        }
    }

    /// Elements that shared a cell with an earlier element.
    pub fn displaced(&self) -> &[usize] {
        &self.displaced
    }

    /// Linear offsets of the 62-cell half stencil.
    pub fn half_stencil(&self) -> Vec<isize> {
        let sx = self.size[0] as isize;
        let sy = self.size[1] as isize;
        let mut offsets = Vec::with_capacity(62);
        for z in 0..=2isize {
            let y_start = if z > 0 { -2 } else { 0 };
            for y in y_start..=2isize {
                let x_start = if z > 0 || y > 0 { -2 } else { 1 };
                for x in x_start..=2isize {
                    offsets.push(x + sx * (y + sy * z));
                }
            }
        }
        offsets
    }

    /// Occupants of the stencil cells around `cell`.
    pub fn stencil_occupants<'a>(
        &'a self,
        cell: usize,
        stencil: &'a [isize],
    ) -> impl Iterator<Item = usize> + 'a {
        stencil
            .iter()
            .filter_map(move |&offset| self.occupant((cell as isize + offset) as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn safety() -> Bounds {
        Bounds::safety(1.0, 1.0)
    }

    #[test]
    fn half_stencil_has_62_distinct_offsets() {
        let lattice = Lattice::build(EntityKind::Grain, 10.0, &[Vec3::ZERO], &safety()).unwrap();
        let mut stencil = lattice.half_stencil();
        assert_eq!(stencil.len(), 62);
        stencil.sort_unstable();
        stencil.dedup();
        assert_eq!(stencil.len(), 62);
        assert!(!stencil.contains(&0));
    }

    #[test]
    fn neighbours_are_found_from_one_side_only() {
        let positions = [Vec3::ZERO, Vec3::new(0.1, 0.0, 0.0)];
        let lattice = Lattice::build(EntityKind::Grain, 10.0, &positions, &safety()).unwrap();
        let stencil = lattice.half_stencil();
        let from_first: Vec<_> = lattice
            .stencil_occupants(lattice.cell_of(positions[0]), &stencil)
            .collect();
        let from_second: Vec<_> = lattice
            .stencil_occupants(lattice.cell_of(positions[1]), &stencil)
            .collect();
        assert_eq!(from_first, vec![1]);
        assert!(from_second.is_empty());
    }

    #[test]
    fn shared_cell_is_reported_as_displaced() {
        let positions = [Vec3::ZERO, Vec3::splat(0.01)];
        let lattice = Lattice::build(EntityKind::Grain, 10.0, &positions, &safety()).unwrap();
        assert_eq!(lattice.displaced(), &[1]);
    }
}
