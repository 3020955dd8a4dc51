//! Neighbor lists and contact evaluation for every interaction type.
//!
//! Each interaction owns a [`ContactSet`]: its contact law, its Verlet list
//! with the carried friction state, and the records of the contacts that
//! produced a force this step. Evaluation runs in three phases: contact
//! inputs are gathered from the stores, evaluated into one output slot per
//! contact, then scatter-added serially into forces and torques.

use std::f32::consts::FRAC_1_SQRT_2;

use glam::{Vec2, Vec3};
use log::debug;

use crate::collision::{
    Bounds, ContactInput, ContactLaw, ContactOutput, ContactSide, FrictionState, Grid, Lattice,
    Pair, VerletList,
};
use crate::config::SimulationConfig;
use crate::core::{GrainProperties, GrainSoA, Membrane, Plates, Wire, WireProperties};
use crate::dynamics::parallel::{evaluate_contacts, map_indices};
use crate::error::{EntityKind, Result};
use crate::utils::logging::warn_if_margin_exhausted;

/// Interaction types, each with its own list and law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interaction {
    GrainGrain,
    GrainMembrane,
    GrainWire,
    GrainBottom,
    GrainTop,
    GrainSide,
    WireBottom,
}

impl Interaction {
    pub const ALL: [Interaction; 7] = [
        Self::GrainGrain,
        Self::GrainMembrane,
        Self::GrainWire,
        Self::GrainBottom,
        Self::GrainTop,
        Self::GrainSide,
        Self::WireBottom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::GrainGrain => "grain-grain",
            Self::GrainMembrane => "grain-membrane",
            Self::GrainWire => "grain-wire",
            Self::GrainBottom => "grain-bottom",
            Self::GrainTop => "grain-top",
            Self::GrainSide => "grain-side",
            Self::WireBottom => "wire-bottom",
        }
    }
}

/// Per-step inputs shared by all interactions.
#[derive(Debug, Clone, Copy)]
pub struct ContactContext<'a> {
    pub grain: &'a GrainProperties,
    pub wire: &'a WireProperties,
    pub cylinder_radius: f32,
    pub safety: Bounds,
    /// Friction ramp in [0, 1].
    pub friction_progress: f32,
    pub parallel: bool,
}

/// Largest speed per entity type over the last step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaxSpeeds {
    pub grain: f32,
    pub wire: f32,
    pub membrane: f32,
}

/// A contact that produced a force this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRecord {
    pub a: u32,
    pub b: u32,
    pub point_a: Vec3,
    pub point_b: Vec3,
    /// Force on A.
    pub force: Vec3,
    pub depth: f32,
}

#[derive(Debug, Clone)]
pub struct ContactSet {
    pub law: ContactLaw,
    pub list: VerletList,
    pub records: Vec<ContactRecord>,
    /// Friction ramps with the packing progress.
    ramped: bool,
}

impl ContactSet {
    fn new(law: ContactLaw, ramped: bool) -> Self {
        Self {
            law,
            list: VerletList::new(),
            records: Vec::new(),
            ramped,
        }
    }

    /// Evaluates every listed pair whose geometry overlaps. Pairs without
    /// overlap lose their friction attachment.
    fn evaluate<F>(&mut self, progress: f32, parallel: bool, geometry: F) -> Vec<(Pair, ContactOutput)>
    where
        F: Fn(Pair) -> Option<ContactInput>,
    {
        let law = if self.ramped {
            self.law.scaled(progress)
        } else {
            self.law
        };
        let mut slots = Vec::with_capacity(self.list.len());
        let mut inputs = Vec::with_capacity(self.list.len());
        for slot in 0..self.list.len() {
            let pair = self.list.pairs()[slot];
            match geometry(pair) {
                Some(mut input) if input.depth > 0.0 => {
                    input.friction = self.list.friction()[slot];
                    slots.push(slot);
                    inputs.push(input);
                }
                _ => self.list.friction_mut()[slot] = FrictionState::UNSET,
            }
        }

        let outputs = evaluate_contacts(&law, &inputs, parallel);

        self.records.clear();
        let mut results = Vec::with_capacity(outputs.len());
        for ((&slot, input), output) in slots.iter().zip(&inputs).zip(outputs) {
            self.list.friction_mut()[slot] = output.friction;
            let (a, b) = self.list.pairs()[slot];
            let point_a = input.a.position + input.a.arm;
            let point_b = match input.b.attachment {
                crate::collision::contact::Attachment::Anchored => point_a,
                _ => input.b.position + input.b.arm,
            };
            self.records.push(ContactRecord {
                a,
                b,
                point_a,
                point_b,
                force: output.force,
                depth: input.depth,
            });
            results.push(((a, b), output));
        }
        results
    }

    /// Elastic energy stored in the contacts of this step.
    pub fn elastic_energy(&self) -> impl Iterator<Item = (u32, u32, f32)> + '_ {
        self.records
            .iter()
            .map(|record| (record.a, record.b, self.law.elastic_energy(record.depth)))
    }
}

/// Owns the contact sets of all interactions.
#[derive(Debug, Clone)]
pub struct ContactManager {
    pub grain_grain: ContactSet,
    pub grain_membrane: ContactSet,
    pub grain_wire: ContactSet,
    pub grain_bottom: ContactSet,
    pub grain_top: ContactSet,
    pub grain_side: ContactSet,
    pub wire_bottom: ContactSet,
}

impl ContactManager {
    pub fn new(config: &SimulationConfig) -> Self {
        let zeta = config.normal_damping_rate;
        let stick = config.static_friction;
        let grain = config.grain.material;
        let friction = config.friction;
        let law = |other, coefficient| ContactLaw::between(&grain, other, zeta, coefficient, stick);
        let obstacle = law(&config.obstacle, friction.grain_obstacle).with_spin_friction(config.spin_friction);
        let wire_floor = ContactLaw::between(
            &config.wire.material,
            &config.obstacle,
            zeta,
            friction.wire_bottom,
            stick,
        );
        Self {
            grain_grain: ContactSet::new(law(&grain, friction.grain_grain), true),
            grain_membrane: ContactSet::new(law(&config.membrane.material, friction.grain_membrane), true),
            grain_wire: ContactSet::new(law(&config.wire.material, friction.grain_wire), true),
            grain_bottom: ContactSet::new(obstacle, true),
            grain_top: ContactSet::new(obstacle, true),
            grain_side: ContactSet::new(obstacle, true),
            wire_bottom: ContactSet::new(wire_floor, false),
        }
    }

    pub fn set(&self, interaction: Interaction) -> &ContactSet {
        match interaction {
            Interaction::GrainGrain => &self.grain_grain,
            Interaction::GrainMembrane => &self.grain_membrane,
            Interaction::GrainWire => &self.grain_wire,
            Interaction::GrainBottom => &self.grain_bottom,
            Interaction::GrainTop => &self.grain_top,
            Interaction::GrainSide => &self.grain_side,
            Interaction::WireBottom => &self.wire_bottom,
        }
    }

    /// Forces every grain list to rebuild.
    pub fn invalidate_grains(&mut self) {
        self.grain_grain.list.invalidate();
        self.grain_membrane.list.invalidate();
        self.grain_wire.list.invalidate();
    }

    pub fn invalidate_wire(&mut self) {
        self.grain_wire.list.invalidate();
    }

    /// Consumes list margins for the displacement of the last step.
    pub fn advance(&mut self, speeds: MaxSpeeds, dt: f32) {
        self.grain_grain.list.advance(2.0 * speeds.grain * dt);
        self.grain_membrane.list.advance((speeds.grain + speeds.membrane) * dt);
        self.grain_wire.list.advance((speeds.grain + speeds.wire) * dt);
    }

    pub fn contact_count(&self) -> usize {
        Interaction::ALL
            .iter()
            .map(|&interaction| self.set(interaction).records.len())
            .sum()
    }

    pub fn rebuilds(&self) -> u64 {
        self.grain_grain.list.rebuilds()
            + self.grain_membrane.list.rebuilds()
            + self.grain_wire.list.rebuilds()
    }

    /// Rebuilds the grain-grain list if its margin ran out. Returns whether
    /// it did.
    pub fn refresh_grain_grain(&mut self, ctx: &ContactContext, grains: &GrainSoA) -> Result<bool> {
        if !self.grain_grain.list.needs_rebuild() {
            return Ok(false);
        }
        let r = ctx.grain.radius;
        let verlet = 2.0 * (2.0 * r / 3f32.sqrt());
        let pairs = grain_grain_candidates(ctx, grains.positions(), verlet)?;
        let margin = verlet - 2.0 * r;
        log_rebuild(Interaction::GrainGrain, pairs.len(), margin);
        self.grain_grain.list.rebuild(pairs, margin);
        Ok(true)
    }

    pub fn grain_grain(&mut self, ctx: &ContactContext, grains: &mut GrainSoA) -> Result<()> {
        self.refresh_grain_grain(ctx, grains)?;
        let r = ctx.grain.radius;
        let store: &GrainSoA = grains;
        let results = self
            .grain_grain
            .evaluate(ctx.friction_progress, ctx.parallel, |(a, b)| {
                let (a, b) = (a as usize, b as usize);
                let relative = store.mass.positions[a] - store.mass.positions[b];
                let length = relative.length();
                if length == 0.0 {
                    return None;
                }
                let normal = relative / length;
                Some(ContactInput {
                    a: grain_contact_side(store, a, -r * normal),
                    b: grain_contact_side(store, b, r * normal),
                    normal,
                    depth: 2.0 * r - length,
                    friction: FrictionState::UNSET,
                    spin_radius: 0.0,
                })
            });
        for ((a, b), out) in results {
            let (a, b) = (a as usize, b as usize);
            grains.mass.forces[a] += out.force;
            grains.mass.forces[b] -= out.force;
            grains.torques[a] += out.torque_a;
            grains.torques[b] += out.torque_b;
        }
        Ok(())
    }

    /// Grain-membrane contacts. Returns the outward radial load on the
    /// membrane.
    pub fn grain_membrane(
        &mut self,
        ctx: &ContactContext,
        grains: &mut GrainSoA,
        membrane: &mut Membrane,
    ) -> Result<f32> {
        let r = ctx.grain.radius;
        if self.grain_membrane.list.needs_rebuild() {
            let verlet = 2.0 * (2.0 * r / 3f32.sqrt()) - r;
            let nodes = &membrane.nodes.positions;
            let owned: Vec<(usize, Vec3)> = membrane.owned().map(|i| (i, nodes[i])).collect();
            let (pairs, nearest) = grain_node_candidates(
                ctx,
                EntityKind::Membrane,
                grains.positions(),
                &owned,
                nodes,
                verlet,
            )?;
            let margin = nearest - r;
            log_rebuild(Interaction::GrainMembrane, pairs.len(), margin);
            self.grain_membrane.list.rebuild(pairs, margin);
        }

        let store: &GrainSoA = grains;
        let nodes = &membrane.nodes;
        let results = self
            .grain_membrane
            .evaluate(ctx.friction_progress, ctx.parallel, |(a, b)| {
                let (a, b) = (a as usize, b as usize);
                let relative = store.mass.positions[a] - nodes.positions[b];
                let length = relative.length();
                if length == 0.0 {
                    return None;
                }
                let normal = relative / length;
                Some(ContactInput {
                    a: grain_contact_side(store, a, -r * normal),
                    b: ContactSide::node(nodes.positions[b], nodes.velocities[b], Vec3::ZERO),
                    normal,
                    depth: r - length,
                    friction: FrictionState::UNSET,
                    spin_radius: 0.0,
                })
            });

        let mut radial = 0.0;
        for ((a, b), out) in results {
            let (a, b) = (a as usize, b as usize);
            grains.mass.forces[a] += out.force;
            grains.torques[a] += out.torque_a;
            membrane.nodes.forces[b] -= out.force;
            let outward = horizontal_direction(membrane.nodes.positions[b]);
            radial += (-out.force).dot(outward);
        }
        Ok(radial)
    }

    pub fn grain_wire(&mut self, ctx: &ContactContext, grains: &mut GrainSoA, wire: &mut Wire) -> Result<()> {
        let r = ctx.grain.radius;
        let rw = ctx.wire.radius;
        if self.grain_wire.list.needs_rebuild() {
            let verlet = 2.0 * r;
            let nodes = &wire.nodes.positions;
            let indexed: Vec<(usize, Vec3)> = nodes.iter().copied().enumerate().collect();
            let (pairs, nearest) = grain_node_candidates(
                ctx,
                EntityKind::Wire,
                grains.positions(),
                &indexed,
                nodes,
                verlet,
            )?;
            let margin = nearest - (r + rw);
            log_rebuild(Interaction::GrainWire, pairs.len(), margin);
            self.grain_wire.list.rebuild(pairs, margin);
        }

        let store: &GrainSoA = grains;
        let nodes = &wire.nodes;
        let results = self
            .grain_wire
            .evaluate(ctx.friction_progress, ctx.parallel, |(a, b)| {
                let (a, b) = (a as usize, b as usize);
                let relative = store.mass.positions[a] - nodes.positions[b];
                let length = relative.length();
                if length == 0.0 {
                    return None;
                }
                let normal = relative / length;
                Some(ContactInput {
                    a: grain_contact_side(store, a, -r * normal),
                    b: ContactSide::node(nodes.positions[b], nodes.velocities[b], rw * normal),
                    normal,
                    depth: r + rw - length,
                    friction: FrictionState::UNSET,
                    spin_radius: 0.0,
                })
            });
        for ((a, b), out) in results {
            let (a, b) = (a as usize, b as usize);
            grains.mass.forces[a] += out.force;
            grains.torques[a] += out.torque_a;
            wire.nodes.forces[b] -= out.force;
        }
        Ok(())
    }

    /// Grain contacts with the bottom plate, and with the top plate when
    /// `with_top` is set; plate loads are accumulated.
    /// The top plate only bears on grains when a membrane confines them.
    pub fn grain_plates(&mut self, ctx: &ContactContext, grains: &mut GrainSoA, plates: &mut Plates, with_top: bool) {
        let r = ctx.grain.radius;
        let progress = ctx.friction_progress;
        let parallel = ctx.parallel;

        let bottom = plates.bottom;
        let candidates = anchored_pairs(grains.positions(), |p| p.z < bottom.z + r);
        self.grain_bottom.list.rebuild(candidates, 0.0);
        let store: &GrainSoA = grains;
        let results = self.grain_bottom.evaluate(progress, parallel, |(a, _)| {
            let a = a as usize;
            let normal = Vec3::Z;
            Some(ContactInput {
                a: grain_contact_side(store, a, -r * normal),
                b: ContactSide::obstacle(bottom.velocity3()),
                normal,
                depth: bottom.z + r - store.mass.positions[a].z,
                friction: FrictionState::UNSET,
                spin_radius: r,
            })
        });
        for ((a, _), out) in results {
            grains.mass.forces[a as usize] += out.force;
            grains.torques[a as usize] += out.torque_a;
            plates.bottom.force += out.force.z;
        }

        let top = plates.top;
        let candidates = if with_top {
            anchored_pairs(grains.positions(), |p| p.z > top.z - r)
        } else {
            Vec::new()
        };
        self.grain_top.list.rebuild(candidates, 0.0);
        let store: &GrainSoA = grains;
        let results = self.grain_top.evaluate(progress, parallel, |(a, _)| {
            let a = a as usize;
            let normal = -Vec3::Z;
            Some(ContactInput {
                a: grain_contact_side(store, a, -r * normal),
                b: ContactSide::obstacle(top.velocity3()),
                normal,
                depth: store.mass.positions[a].z + r - top.z,
                friction: FrictionState::UNSET,
                spin_radius: r,
            })
        });
        for ((a, _), out) in results {
            grains.mass.forces[a as usize] += out.force;
            grains.torques[a as usize] += out.torque_a;
            plates.top.force -= out.force.z;
        }
    }

    /// Rigid cylindrical side wall, used when no membrane confines the
    /// grains. Returns the outward radial load on the wall.
    pub fn grain_side(&mut self, ctx: &ContactContext, grains: &mut GrainSoA) -> f32 {
        let r = ctx.grain.radius;
        let inner = ctx.cylinder_radius - r;
        let candidates = anchored_pairs(grains.positions(), |p| {
            Vec2::new(p.x, p.y).length_squared() >= inner * inner
        });
        self.grain_side.list.rebuild(candidates, 0.0);
        let store: &GrainSoA = grains;
        let results = self
            .grain_side
            .evaluate(ctx.friction_progress, ctx.parallel, |(a, _)| {
                let a = a as usize;
                let p = store.mass.positions[a];
                let length = Vec2::new(p.x, p.y).length();
                if length == 0.0 {
                    return None;
                }
                let normal = Vec3::new(-p.x / length, -p.y / length, 0.0);
                Some(ContactInput {
                    a: grain_contact_side(store, a, -r * normal),
                    b: ContactSide::obstacle(Vec3::ZERO),
                    normal,
                    depth: length - inner,
                    friction: FrictionState::UNSET,
                    spin_radius: r,
                })
            });
        let mut radial = 0.0;
        for ((a, _), out) in results {
            let a = a as usize;
            grains.mass.forces[a] += out.force;
            grains.torques[a] += out.torque_a;
            radial -= out.force.dot(horizontal_direction(grains.mass.positions[a]));
        }
        radial
    }

    pub fn wire_bottom(&mut self, ctx: &ContactContext, wire: &mut Wire, plates: &Plates) {
        let rw = ctx.wire.radius;
        let bottom = plates.bottom;
        let candidates = anchored_pairs(&wire.nodes.positions, |p| p.z <= bottom.z + rw);
        self.wire_bottom.list.rebuild(candidates, 0.0);
        let nodes = &wire.nodes;
        let results = self
            .wire_bottom
            .evaluate(ctx.friction_progress, ctx.parallel, |(a, _)| {
                let a = a as usize;
                let normal = Vec3::Z;
                Some(ContactInput {
                    a: ContactSide::node(nodes.positions[a], nodes.velocities[a], -rw * normal),
                    b: ContactSide::obstacle(bottom.velocity3()),
                    normal,
                    depth: bottom.z + rw - nodes.positions[a].z,
                    friction: FrictionState::UNSET,
                    spin_radius: 0.0,
                })
            });
        for ((a, _), out) in results {
            wire.nodes.forces[a as usize] += out.force;
        }
    }
}

fn grain_contact_side(grains: &GrainSoA, index: usize, arm: Vec3) -> ContactSide {
    ContactSide::grain(
        grains.mass.positions[index],
        grains.mass.velocities[index],
        grains.angular_velocities[index],
        grains.rotations[index],
        arm,
    )
}

/// Unit radial direction of `p` in the horizontal plane.
fn horizontal_direction(p: Vec3) -> Vec3 {
    Vec3::new(p.x, p.y, 0.0).normalize_or(Vec3::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0))
}

/// Pairs `(i, 0)` for every element matching `touches`.
fn log_rebuild(interaction: Interaction, pairs: usize, margin: f32) {
    debug!("{}: {pairs} pairs, margin {margin:.3e}", interaction.label());
    warn_if_margin_exhausted(interaction.label(), margin);
}

fn anchored_pairs<F>(positions: &[Vec3], touches: F) -> Vec<Pair>
where
    F: Fn(Vec3) -> bool,
{
    positions
        .iter()
        .enumerate()
        .filter(|(_, &p)| touches(p))
        .map(|(i, _)| (i as u32, 0))
        .collect()
}

fn ordered(i: usize, j: usize) -> Pair {
    if i < j {
        (i as u32, j as u32)
    } else {
        (j as u32, i as u32)
    }
}

/// Grain pairs closer than `verlet`, found through the single-occupant
/// lattice. Grains displaced from a shared cell are matched by brute force.
fn grain_grain_candidates(ctx: &ContactContext, positions: &[Vec3], verlet: f32) -> Result<Vec<Pair>> {
    let r = ctx.grain.radius;
    let lattice = Lattice::build(EntityKind::Grain, 3f32.sqrt() / (2.0 * r), positions, &ctx.safety)?;
    let stencil = lattice.half_stencil();
    let reach = verlet * verlet;
    let near = |i: usize, j: usize| positions[i].distance_squared(positions[j]) < reach;

    let per_grain: Vec<Vec<Pair>> = map_indices(positions.len(), ctx.parallel, |i| {
        let cell = lattice.cell_of(positions[i]);
        if lattice.occupant(cell) != Some(i) {
            return Vec::new();
        }
        lattice
            .stencil_occupants(cell, &stencil)
            .filter(|&j| near(i, j))
            .map(|j| ordered(i, j))
            .collect()
    });
    let mut pairs: Vec<Pair> = per_grain.into_iter().flatten().collect();

    let displaced = lattice.displaced();
    if !displaced.is_empty() {
        debug!("grain-grain: {} grains share a lattice cell", displaced.len());
    }
    for &i in displaced {
        for j in 0..positions.len() {
            let both_displaced = displaced.binary_search(&j).is_ok();
            if j == i || (both_displaced && j < i) {
                continue;
            }
            if near(i, j) {
                pairs.push(ordered(i, j));
            }
        }
    }
    Ok(pairs)
}

/// Grain to node pairs closer than `verlet`, and the distance of the nearest
/// node that was left out (at most one grid cell).
fn grain_node_candidates(
    ctx: &ContactContext,
    kind: EntityKind,
    grains: &[Vec3],
    indexed: &[(usize, Vec3)],
    nodes: &[Vec3],
    verlet: f32,
) -> Result<(Vec<Pair>, f32)> {
    let cell = 2.0 * ctx.grain.radius;
    if indexed.is_empty() || grains.is_empty() {
        return Ok((Vec::new(), cell));
    }
    let grid = Grid::build(kind, cell, indexed.iter().copied(), &ctx.safety)?;
    let per_grain: Vec<(Vec<Pair>, f32)> = map_indices(grains.len(), ctx.parallel, |i| {
        let p = grains[i];
        let mut pairs = Vec::new();
        let mut nearest = cell;
        for j in grid.query(p) {
            let distance = p.distance(nodes[j]);
            if distance < verlet {
                pairs.push((i as u32, j as u32));
            } else {
                nearest = nearest.min(distance);
            }
        }
        (pairs, nearest)
    });
    let nearest = per_grain.iter().map(|(_, d)| *d).fold(cell, f32::min);
    let pairs = per_grain.into_iter().flat_map(|(pairs, _)| pairs).collect();
    Ok((pairs, nearest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Parameters, SimulationConfig};
    use glam::Quat;

    fn config() -> SimulationConfig {
        let params = Parameters::parse(
            "TimeStep=1e-6,Radius=20,Pressure=80000,Speed=1,sfSpeed=1,sfLength=0.001,sfStiffness=1,sfDamping=0,G=0",
        )
        .unwrap();
        SimulationConfig::from_parameters(&params).unwrap()
    }

    fn context(config: &SimulationConfig) -> ContactContext<'_> {
        ContactContext {
            grain: &config.grain,
            wire: &config.wire,
            cylinder_radius: config.radius,
            safety: Bounds::safety(config.lattice_radius(), config.height),
            friction_progress: 1.0,
            parallel: false,
        }
    }

    #[test]
    fn rebuild_without_motion_is_idempotent() {
        let config = config();
        let ctx = context(&config);
        let mut grains = GrainSoA::with_capacity(16);
        let r = config.grain.radius;
        for i in 0..4 {
            let p = Vec3::new(i as f32 * 1.9 * r, 0.0, 0.01);
            grains.push(p, Vec3::ZERO, Quat::IDENTITY).unwrap();
        }
        let mut manager = ContactManager::new(&config);
        manager.refresh_grain_grain(&ctx, &grains).unwrap();
        let pairs = manager.grain_grain.list.pairs().to_vec();
        manager.grain_grain.list.invalidate();
        manager.refresh_grain_grain(&ctx, &grains).unwrap();
        assert_eq!(manager.grain_grain.list.pairs(), pairs.as_slice());
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn displaced_grains_still_find_neighbours() {
        let config = config();
        let ctx = context(&config);
        let r = config.grain.radius;
        let positions = [Vec3::new(0.0, 0.0, 0.01), Vec3::new(0.1 * r, 0.0, 0.01), Vec3::new(1.9 * r, 0.0, 0.01)];
        let verlet = 2.0 * (2.0 * r / 3f32.sqrt());
        let mut pairs = grain_grain_candidates(&ctx, &positions, verlet).unwrap();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }
}
