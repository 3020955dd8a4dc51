//! Additional math helpers layered on top of `glam`.

use std::f32::consts::PI;

use glam::{Quat, Vec2, Vec3};
use rand::Rng;

/// First order quaternion update q + dt/2·(ω, 0)·q, not normalised.
pub fn integrate_rotation(rotation: Quat, angular_velocity: Vec3, dt: f32) -> Quat {
    let spin = Quat::from_xyzw(angular_velocity.x, angular_velocity.y, angular_velocity.z, 0.0);
    rotation + (spin * rotation) * (dt / 2.0)
}

/// Uniformly distributed orientation.
pub fn random_orientation<R: Rng + ?Sized>(rng: &mut R) -> Quat {
    let t0 = 2.0 * PI * rng.gen::<f32>();
    let t1 = (1.0 - 2.0 * rng.gen::<f32>()).acos();
    let t2 = (PI * rng.gen::<f32>() + rng.gen::<f32>().acos()) / 2.0;
    Quat::from_xyzw(
        t0.sin() * t1.sin() * t2.sin(),
        t0.cos() * t1.sin() * t2.sin(),
        t1.cos() * t2.sin(),
        t2.cos(),
    )
    .normalize()
}

/// Uniform point in the unit disk, by rejection.
pub fn random_in_unit_disk<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    loop {
        let p = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        if p.length_squared() <= 1.0 {
            return p;
        }
    }
}

/// `v` with its component along the unit `normal` removed.
#[inline]
pub fn reject(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * normal.dot(v)
}
