use glam::Vec3;

use crate::collision::bounds::Bounds;
use crate::error::{DemError, EntityKind, Result};

/// Occupant slots per grid cell.
pub const CELL_CAPACITY: usize = 16;

const GUARD: usize = 1;

/// Uniform grid with fixed-capacity occupant lists, used to look up wire and
/// membrane nodes around grains.
#[derive(Debug, Clone)]
pub struct Grid {
    kind: EntityKind,
    scale: f32,
    min: Vec3,
    size: [usize; 3],
    counts: Vec<u8>,
    slots: Vec<u32>,
}

impl Grid {
    /// Indexes `points` into cells `cell_size` wide.
    ///
    /// Fails when a cell would hold more than [`CELL_CAPACITY`] points.
    pub fn build<I>(kind: EntityKind, cell_size: f32, points: I, safety: &Bounds) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, Vec3)> + Clone,
    {
        let scale = 1.0 / cell_size;
        let bounds = Bounds::enclosing(kind, points.clone(), safety)?
            .unwrap_or(Bounds::new(Vec3::ZERO, Vec3::ZERO));
        let size = bounds.cell_counts(kind, scale, GUARD)?;
        let cell_count = size[0] * size[1] * size[2];
        let mut grid = Self {
            kind,
            scale,
            min: bounds.min,
            size,
            counts: vec![0; cell_count],
            slots: vec![0; cell_count * CELL_CAPACITY],
        };
        for (index, p) in points {
            grid.insert(index, p)?;
        }
        Ok(grid)
    }

    fn coords(&self, p: Vec3) -> [i64; 3] {
        let local = (p - self.min) * self.scale;
        [
            local.x.floor() as i64 + GUARD as i64,
            local.y.floor() as i64 + GUARD as i64,
            local.z.floor() as i64 + GUARD as i64,
        ]
    }

    fn cell(&self, c: [i64; 3]) -> Option<usize> {
        let inside = (0..3).all(|axis| c[axis] >= 0 && (c[axis] as usize) < self.size[axis]);
        inside.then(|| {
            c[0] as usize + self.size[0] * (c[1] as usize + self.size[1] * c[2] as usize)
        })
    }

    fn insert(&mut self, index: usize, p: Vec3) -> Result<()> {
        let cell = self.cell(self.coords(p)).ok_or_else(|| DemError::Domain {
            kind: self.kind,
            index,
            detail: format!("{p:?} outside grid"),
        })?;
        let count = self.counts[cell] as usize;
        if count == CELL_CAPACITY {
            return Err(DemError::Capacity {
                kind: self.kind,
                capacity: CELL_CAPACITY,
            });
        }
        self.slots[cell * CELL_CAPACITY + count] = index as u32;
        self.counts[cell] += 1;
        Ok(())
    }

    /// Points in the 3×3×3 block of cells around `p`.
    pub fn query(&self, p: Vec3) -> impl Iterator<Item = usize> + '_ {
        let center = self.coords(p);
        (-1..=1i64)
            .flat_map(move |dz| (-1..=1i64).flat_map(move |dy| (-1..=1i64).map(move |dx| (dx, dy, dz))))
            .filter_map(move |(dx, dy, dz)| self.cell([center[0] + dx, center[1] + dy, center[2] + dz]))
            .flat_map(move |cell| {
                let start = cell * CELL_CAPACITY;
                self.slots[start..start + self.counts[cell] as usize]
                    .iter()
                    .map(|&index| index as usize)
            })
    }
}
