//! Hertz contact with viscous damping, Coulomb friction and a static
//! friction spring.
//!
//! The kernel is a pure function of a [`ContactInput`]: geometry, the state
//! of both bodies and the carried friction attachment. Contacts are evaluated
//! either one by one ([`evaluate`]) or four at a time ([`ContactBatch`]);
//! both paths perform the same floating point operations in the same order.

use glam::{Quat, Vec3, Vec4};

use crate::core::types::{Material, StaticFriction};
use crate::collision::verlet::FrictionState;
use crate::dynamics::friction::{self, FrictionLaw, Regime, TangentialInput};
use crate::utils::simd::{lane_sqrt, Vec3x4, LANES};

/// Constants of one interaction type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactLaw {
    /// Hertz stiffness K = 4/3·E*·√R*.
    pub stiffness: f32,
    /// Normal damping Kb = 2ζ·√(2·√R*·E*·m*).
    pub damping: f32,
    pub friction: FrictionLaw,
    /// Rolling resistance applied against z spin on obstacle contacts.
    pub spin_friction: f32,
}

impl ContactLaw {
    pub fn between(
        a: &Material,
        b: &Material,
        damping_rate: f32,
        coefficient: f32,
        stick: StaticFriction,
    ) -> Self {
        let modulus = a.effective_modulus(b);
        let radius = a.effective_radius(b);
        let mass = a.effective_mass(b);
        Self {
            stiffness: 4.0 / 3.0 * modulus * radius.sqrt(),
            damping: 2.0 * damping_rate * (2.0 * radius.sqrt() * modulus * mass).sqrt(),
            friction: FrictionLaw::new(coefficient, stick),
            spin_friction: 0.0,
        }
    }

    pub fn with_spin_friction(mut self, spin_friction: f32) -> Self {
        self.spin_friction = spin_friction;
        self
    }

    /// Same law with friction ramped by `progress`.
    pub fn scaled(&self, progress: f32) -> Self {
        Self {
            friction: self.friction.scaled(progress),
            ..*self
        }
    }

    /// Fn = K·d·√d − Kb·d^¼·(N·RV).
    #[inline]
    pub fn normal_force(&self, depth: f32, normal_speed: f32) -> f32 {
        let elastic = self.stiffness * depth * depth.sqrt();
        let damping = -self.damping * depth.sqrt().sqrt() * normal_speed;
        elastic + damping
    }

    /// Energy stored in the elastic part of the contact, 2/5·K·d^(5/2).
    pub fn elastic_energy(&self, depth: f32) -> f32 {
        2.0 / 5.0 * self.stiffness * depth * depth * depth.sqrt()
    }
}

/// How a body carries a friction attachment point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attachment {
    /// Stored in the body frame of a rotating body.
    Rotating(Quat),
    /// Stored as an offset from a non-rotating node.
    Translating,
    /// Stored as a world point on an immovable surface.
    Anchored,
}

/// One side of a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSide {
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// From the body center to the contact point.
    pub arm: Vec3,
    pub attachment: Attachment,
}

impl ContactSide {
    pub fn grain(position: Vec3, velocity: Vec3, angular_velocity: Vec3, rotation: Quat, arm: Vec3) -> Self {
        Self {
            position,
            velocity,
            angular_velocity,
            arm,
            attachment: Attachment::Rotating(rotation),
        }
    }

    pub fn node(position: Vec3, velocity: Vec3, arm: Vec3) -> Self {
        Self {
            position,
            velocity,
            angular_velocity: Vec3::ZERO,
            arm,
            attachment: Attachment::Translating,
        }
    }

    /// Immovable surface, possibly translating (a moving plate).
    pub fn obstacle(velocity: Vec3) -> Self {
        Self {
            position: Vec3::ZERO,
            velocity,
            angular_velocity: Vec3::ZERO,
            arm: Vec3::ZERO,
            attachment: Attachment::Anchored,
        }
    }

    #[inline]
    pub fn point_velocity(&self) -> Vec3 {
        self.velocity + self.angular_velocity.cross(self.arm)
    }

    fn attach(&self, contact_point: Vec3) -> Vec3 {
        match self.attachment {
            Attachment::Rotating(rotation) => rotation.conjugate() * self.arm,
            Attachment::Translating => self.arm,
            Attachment::Anchored => contact_point,
        }
    }

    fn attachment_point(&self, local: Vec3) -> Vec3 {
        match self.attachment {
            Attachment::Rotating(rotation) => self.position + rotation * local,
            Attachment::Translating => self.position + local,
            Attachment::Anchored => local,
        }
    }
}

/// Everything the kernel needs to evaluate one contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInput {
    pub a: ContactSide,
    pub b: ContactSide,
    /// Unit normal pointing from B toward A.
    pub normal: Vec3,
    pub depth: f32,
    pub friction: FrictionState,
    /// Radius used for spin friction, zero when not applicable.
    pub spin_radius: f32,
}

impl ContactInput {
    #[inline]
    pub fn relative_velocity(&self) -> Vec3 {
        self.a.point_velocity() - self.b.point_velocity()
    }
}

/// Force and torques from one contact. The force applies to A; B receives
/// its opposite.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactOutput {
    pub force: Vec3,
    pub torque_a: Vec3,
    pub torque_b: Vec3,
    pub normal_force: f32,
    pub friction: FrictionState,
}

/// Evaluates one contact.
pub fn evaluate(law: &ContactLaw, input: &ContactInput) -> ContactOutput {
    if !(input.depth > 0.0) {
        return ContactOutput::default();
    }
    let relative_velocity = input.relative_velocity();
    let normal_speed = input.normal.dot(relative_velocity);
    let normal_force = law.normal_force(input.depth, normal_speed);
    let tangent_velocity = relative_velocity - input.normal * normal_speed;
    let tangent_speed = tangent_velocity.length();
    resolve(law, input, relative_velocity, normal_force, tangent_velocity, tangent_speed)
}

fn resolve(
    law: &ContactLaw,
    input: &ContactInput,
    relative_velocity: Vec3,
    normal_force: f32,
    tangent_velocity: Vec3,
    tangent_speed: f32,
) -> ContactOutput {
    let (a, b) = (&input.a, &input.b);
    let mut state = input.friction;
    if state.is_unset() {
        let contact_point = a.position + a.arm;
        state = FrictionState {
            local_a: a.attach(contact_point),
            local_b: b.attach(contact_point),
        };
    }
    let separation = b.attachment_point(state.local_b) - a.attachment_point(state.local_a);
    let (tangential, regime) = friction::tangential_force(
        &law.friction,
        &TangentialInput {
            normal: input.normal,
            normal_force,
            relative_velocity,
            tangent_velocity,
            tangent_speed,
            separation,
        },
    );
    if regime == Regime::Sliding {
        state = FrictionState::UNSET;
    }

    let mut torque_a = a.arm.cross(tangential);
    torque_a.z -= law.spin_friction * input.spin_radius * a.angular_velocity.z;
    ContactOutput {
        force: normal_force * input.normal + tangential,
        torque_a,
        torque_b: b.arm.cross(-tangential),
        normal_force,
        friction: state,
    }
}

/// Four contacts evaluated in `Vec4` lanes.
#[derive(Debug, Clone, Copy)]
pub struct ContactBatch {
    lanes: [ContactInput; LANES],
}

impl ContactBatch {
    pub fn new(lanes: [ContactInput; LANES]) -> Self {
        Self { lanes }
    }

    pub fn evaluate(&self, law: &ContactLaw) -> [ContactOutput; LANES] {
        let relative: [Vec3; LANES] = std::array::from_fn(|i| self.lanes[i].relative_velocity());
        let normal = Vec3x4::from_lanes(std::array::from_fn(|i| self.lanes[i].normal));
        let velocity = Vec3x4::from_lanes(relative);
        let depth = Vec4::from_array(std::array::from_fn(|i| self.lanes[i].depth));

        let normal_speed = normal.dot(velocity);
        let root = lane_sqrt(depth);
        let elastic = Vec4::splat(law.stiffness) * depth * root;
        let damping = Vec4::splat(-law.damping) * lane_sqrt(root) * normal_speed;
        let normal_force = elastic + damping;
        let tangent = velocity.sub(normal.scale(normal_speed));
        let tangent_speed = tangent.length();

        std::array::from_fn(|i| {
            let input = &self.lanes[i];
            if !(input.depth > 0.0) {
                return ContactOutput::default();
            }
            resolve(
                law,
                input,
                relative[i],
                normal_force[i],
                tangent.lane(i),
                tangent_speed[i],
            )
        })
    }
}

/// Evaluates `inputs` into `outputs` slot for slot: full lane groups go
/// through [`ContactBatch`], the remainder through [`evaluate`].
pub fn evaluate_slice(law: &ContactLaw, inputs: &[ContactInput], outputs: &mut [ContactOutput]) {
    debug_assert_eq!(inputs.len(), outputs.len());
    let mut input_groups = inputs.chunks_exact(LANES);
    let mut output_groups = outputs.chunks_exact_mut(LANES);
    for (group, out) in (&mut input_groups).zip(&mut output_groups) {
        let lanes: [ContactInput; LANES] = std::array::from_fn(|i| group[i]);
        out.copy_from_slice(&ContactBatch::new(lanes).evaluate(law));
    }
    for (input, out) in input_groups
        .remainder()
        .iter()
        .zip(output_groups.into_remainder())
    {
        *out = evaluate(law, input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GrainProperties;

    fn grain() -> GrainProperties {
        GrainProperties::new(2.5e-3, 7.8e3, 1.97e11, 0.28)
    }

    fn law(coefficient: f32) -> ContactLaw {
        let m = grain().material;
        ContactLaw::between(&m, &m, 1.0, coefficient, StaticFriction::default())
    }

    fn pair(gap: f32, velocity_a: Vec3) -> ContactInput {
        let r = grain().radius;
        let a = Vec3::new(2.0 * r - gap, 0.0, 0.0);
        let normal = Vec3::X;
        ContactInput {
            a: ContactSide::grain(a, velocity_a, Vec3::ZERO, Quat::IDENTITY, -r * normal),
            b: ContactSide::grain(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, Quat::IDENTITY, r * normal),
            normal,
            depth: gap,
            friction: FrictionState::UNSET,
            spin_radius: 0.0,
        }
    }

    #[test]
    fn separated_contact_produces_nothing() {
        let out = evaluate(&law(0.1), &pair(-1e-6, Vec3::ZERO));
        assert_eq!(out, ContactOutput::default());
        assert!(out.friction.is_unset());
    }

    #[test]
    fn overlap_pushes_a_away_from_b() {
        let out = evaluate(&law(0.0), &pair(1e-5, Vec3::ZERO));
        assert!(out.force.x > 0.0);
        assert!(out.force.y.abs() < 1e-9 && out.force.z.abs() < 1e-9);
        assert_eq!(out.torque_a, Vec3::ZERO);
    }

    #[test]
    fn approaching_contact_is_damped_harder() {
        let law = law(0.0);
        let resting = law.normal_force(1e-5, 0.0);
        let approaching = law.normal_force(1e-5, -0.1);
        assert!(approaching > resting);
    }

    #[test]
    fn batch_matches_scalar_bit_for_bit() {
        let law = law(0.3);
        let inputs: Vec<_> = (0..7)
            .map(|i| {
                let mut input = pair(1e-6 * (i as f32 - 1.0), Vec3::new(0.01, 0.02 * i as f32, -0.003));
                input.a.angular_velocity = Vec3::new(1.0, -2.0, 0.5 * i as f32);
                input
            })
            .collect();
        let mut batched = vec![ContactOutput::default(); inputs.len()];
        evaluate_slice(&law, &inputs, &mut batched);
        for (input, out) in inputs.iter().zip(&batched) {
            let scalar = evaluate(&law, input);
            assert_eq!(scalar.force.to_array().map(f32::to_bits), out.force.to_array().map(f32::to_bits));
            assert_eq!(scalar.torque_a.to_array().map(f32::to_bits), out.torque_a.to_array().map(f32::to_bits));
            assert_eq!(scalar.friction, out.friction);
        }
    }
}
