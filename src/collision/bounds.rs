use glam::Vec3;

use crate::error::{DemError, EntityKind, Result};

/// Upper bound on cells along any axis of a lattice or grid.
pub const MAX_AXIS_CELLS: usize = 4096;

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Region the spatial indices may cover: 1.5× the confining radius
    /// horizontally and z in [-height, 2·height].
    pub fn safety(radius: f32, height: f32) -> Self {
        let r = 1.5 * radius;
        Self {
            min: Vec3::new(-r, -r, -height),
            max: Vec3::new(r, r, 2.0 * height),
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Smallest box around `points`, or `None` when there are none.
    ///
    /// Fails on the first point that is not finite or lies outside `safety`.
    pub fn enclosing<I>(kind: EntityKind, points: I, safety: &Bounds) -> Result<Option<Bounds>>
    where
        I: IntoIterator<Item = (usize, Vec3)>,
    {
        let mut bounds: Option<Bounds> = None;
        for (index, p) in points {
            if !p.is_finite() {
                return Err(DemError::NonFinite {
                    kind,
                    index,
                    quantity: "position",
                });
            }
            if !safety.contains(p) {
                return Err(DemError::Domain {
                    kind,
                    index,
                    detail: format!("{p:?} outside {:?}..{:?}", safety.min, safety.max),
                });
            }
            bounds = Some(match bounds {
                Some(b) => Bounds::new(b.min.min(p), b.max.max(p)),
                None => Bounds::new(p, p),
            });
        }
        Ok(bounds)
    }

    /// Cell counts covering this box at `cells_per_meter`, plus `guard`
    /// cells on each side.
    pub fn cell_counts(&self, kind: EntityKind, cells_per_meter: f32, guard: usize) -> Result<[usize; 3]> {
        let extent = self.extent() * cells_per_meter;
        let mut counts = [0usize; 3];
        for (axis, count) in counts.iter_mut().enumerate() {
            let cells = extent[axis].floor() as usize + 1 + 2 * guard;
            if cells > MAX_AXIS_CELLS {
                return Err(DemError::Domain {
                    kind,
                    index: axis,
                    detail: format!("{cells} cells along axis {axis} exceed {MAX_AXIS_CELLS}"),
                });
            }
            *count = cells;
        }
        Ok(counts)
    }
}
