use glam::Vec3;

use crate::core::types::StaticFriction;
use crate::utils::math::reject;

/// Coulomb coefficient plus the static spring that holds sticking contacts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrictionLaw {
    pub coefficient: f32,
    pub stick: StaticFriction,
}

impl FrictionLaw {
    pub fn new(coefficient: f32, stick: StaticFriction) -> Self {
        Self { coefficient, stick }
    }

    /// Friction ramped by `progress` in [0, 1]. At zero the contact can
    /// neither slide with resistance nor stick.
    pub fn scaled(&self, progress: f32) -> Self {
        let progress = progress.clamp(0.0, 1.0);
        Self {
            coefficient: self.coefficient * progress,
            stick: StaticFriction {
                stiffness: self.stick.stiffness * progress,
                damping: self.stick.damping * progress,
                length: if progress > 0.0 { self.stick.length } else { 0.0 },
                speed: self.stick.speed,
            },
        }
    }
}

/// Whether a contact held by its spring or slid this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Static,
    Sliding,
}

/// Kinematics of one contact needed to resolve its tangential force.
#[derive(Debug, Clone, Copy)]
pub struct TangentialInput {
    pub normal: Vec3,
    pub normal_force: f32,
    pub relative_velocity: Vec3,
    pub tangent_velocity: Vec3,
    pub tangent_speed: f32,
    /// Attachment point of B minus attachment point of A.
    pub separation: Vec3,
}

/// Sliding friction opposing the tangential velocity, zero when at rest.
#[inline]
pub fn dynamic_friction(coefficient: f32, normal_force: f32, tangent_velocity: Vec3, tangent_speed: f32) -> Vec3 {
    if tangent_speed > 0.0 {
        (-coefficient * normal_force / tangent_speed) * tangent_velocity
    } else {
        Vec3::ZERO
    }
}

/// Tangential force on A.
///
/// A contact sticks while its spring is shorter than the static length and
/// it slides slower than the static speed. A sticking contact pulls A toward
/// B's attachment point with a damped spring whose stiffness scales with the
/// normal force; otherwise dynamic friction applies.
pub fn tangential_force(law: &FrictionLaw, input: &TangentialInput) -> (Vec3, Regime) {
    let sliding = dynamic_friction(
        law.coefficient,
        input.normal_force,
        input.tangent_velocity,
        input.tangent_speed,
    );
    let offset = reject(input.separation, input.normal);
    let spring_length = offset.length();
    let sticks = spring_length < law.stick.length && input.tangent_speed < law.stick.speed;
    if !sticks {
        return (sliding, Regime::Sliding);
    }
    if spring_length > 0.0 {
        let direction = offset / spring_length;
        let spring = law.stick.stiffness * input.normal_force * spring_length;
        let damping = law.stick.damping * direction.dot(input.relative_velocity);
        ((spring - damping) * direction, Regime::Static)
    } else {
        (sliding, Regime::Static)
    }
}
