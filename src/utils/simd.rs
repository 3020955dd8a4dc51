//! Lane helpers for batched contact math.
//!
//! Four contacts are evaluated side by side in `Vec4` lanes. Every helper
//! here performs, per lane, exactly the scalar operations the single contact
//! path performs, in the same order, so both paths produce the same bits.

use glam::{Vec3, Vec4};

/// Number of contacts per lane group.
pub const LANES: usize = 4;

/// Structure-of-Arrays SIMD vector holding 4 3D vectors.
///
/// x: [v0.x, v1.x, v2.x, v3.x]
/// y: [v0.y, v1.y, v2.y, v3.y]
/// z: [v0.z, v1.z, v2.z, v3.z]
#[derive(Clone, Copy, Debug)]
pub struct Vec3x4 {
    pub x: Vec4,
    pub y: Vec4,
    pub z: Vec4,
}

impl Vec3x4 {
    pub fn from_lanes(v: [Vec3; LANES]) -> Self {
        Self {
            x: Vec4::new(v[0].x, v[1].x, v[2].x, v[3].x),
            y: Vec4::new(v[0].y, v[1].y, v[2].y, v[3].y),
            z: Vec4::new(v[0].z, v[1].z, v[2].z, v[3].z),
        }
    }

    pub fn lane(&self, i: usize) -> Vec3 {
        Vec3::new(self.x[i], self.y[i], self.z[i])
    }

    /// Same association as `Vec3::dot`: (x·x + y·y) + z·z.
    pub fn dot(&self, other: Self) -> Vec4 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn sub(&self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    /// Multiplies each lane vector by its scalar.
    pub fn scale(&self, s: Vec4) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    pub fn length(&self) -> Vec4 {
        lane_sqrt(self.dot(*self))
    }
}

/// Per-lane `f32::sqrt`.
#[inline]
pub fn lane_sqrt(v: Vec4) -> Vec4 {
    Vec4::new(v.x.sqrt(), v.y.sqrt(), v.z.sqrt(), v.w.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_round_trip_through_layout() {
        let lanes = [Vec3::X, Vec3::Y, Vec3::Z, Vec3::ONE];
        let packed = Vec3x4::from_lanes(lanes);
        for (i, v) in lanes.iter().enumerate() {
            assert_eq!(packed.lane(i), *v);
        }
    }

    #[test]
    fn lane_length_matches_scalar_bits() {
        let lanes = [
            Vec3::new(0.1, 0.2, 0.3),
            Vec3::new(-1e-4, 3e-5, 7.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::ZERO,
        ];
        let lengths = Vec3x4::from_lanes(lanes).length();
        for (i, v) in lanes.iter().enumerate() {
            assert_eq!(lengths[i].to_bits(), v.length().to_bits());
        }
    }
}
