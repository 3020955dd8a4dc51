//! Verlet neighbor lists with persistent friction state.
//!
//! A list stays valid while its margin, the smallest distance any candidate
//! must still close before it could touch, remains positive. Every step the
//! margin shrinks by the largest relative displacement; once exhausted the
//! list is rebuilt and the friction state of surviving pairs is carried over.

use std::collections::HashMap;

use glam::Vec3;

/// Element pair `(a, b)`: `a` is the anchor element, `b` its counterpart.
pub type Pair = (u32, u32);

/// Body-frame attachment points of a sticking contact.
///
/// `local_a == ZERO` marks a contact whose attachment is not yet set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrictionState {
    pub local_a: Vec3,
    pub local_b: Vec3,
}

impl FrictionState {
    pub const UNSET: Self = Self {
        local_a: Vec3::ZERO,
        local_b: Vec3::ZERO,
    };

    pub fn is_unset(&self) -> bool {
        self.local_a == Vec3::ZERO
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerletList {
    pairs: Vec<Pair>,
    friction: Vec<FrictionState>,
    margin: f32,
    rebuilds: u64,
}

impl VerletList {
    /// Empty list that rebuilds on first use.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn friction(&self) -> &[FrictionState] {
        &self.friction
    }

    pub fn friction_mut(&mut self) -> &mut [FrictionState] {
        &mut self.friction
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn needs_rebuild(&self) -> bool {
        self.margin <= 0.0
    }

    /// Forces a rebuild on the next step.
    pub fn invalidate(&mut self) {
        self.margin = 0.0;
    }

    /// Consumes margin for elements that moved up to `displacement`.
    pub fn advance(&mut self, displacement: f32) {
        self.margin -= displacement;
    }

    /// Replaces the pair set, keeping the friction state of pairs present
    /// in both the previous and the new set.
    pub fn rebuild(&mut self, pairs: Vec<Pair>, margin: f32) {
        let previous_pairs = std::mem::replace(&mut self.pairs, pairs);
        let previous_friction = std::mem::take(&mut self.friction);

        let mut by_anchor: HashMap<u32, Vec<(u32, FrictionState)>> = HashMap::new();
        for (&(a, b), state) in previous_pairs.iter().zip(&previous_friction) {
            if !state.is_unset() {
                by_anchor.entry(a).or_default().push((b, *state));
            }
        }

        self.friction = self
            .pairs
            .iter()
            .map(|&(a, b)| {
                by_anchor
                    .get(&a)
                    .and_then(|list| list.iter().find(|(other, _)| *other == b))
                    .map_or(FrictionState::UNSET, |&(_, state)| state)
            })
            .collect();
        self.margin = margin;
        self.rebuilds += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(x: f32) -> FrictionState {
        FrictionState {
            local_a: Vec3::new(x, 0.0, 0.0),
            local_b: Vec3::new(0.0, x, 0.0),
        }
    }

    #[test]
    fn new_list_requires_rebuild() {
        assert!(VerletList::new().needs_rebuild());
    }

    #[test]
    fn surviving_pairs_keep_friction_state() {
        let mut list = VerletList::new();
        list.rebuild(vec![(0, 1), (0, 2), (3, 4)], 1.0);
        list.friction_mut()[0] = state(1.0);
        list.friction_mut()[2] = state(2.0);

        list.rebuild(vec![(3, 4), (0, 1), (5, 6)], 1.0);
        assert_eq!(list.friction()[0], state(2.0));
        assert_eq!(list.friction()[1], state(1.0));
        assert!(list.friction()[2].is_unset());
    }

    #[test]
    fn rebuild_with_same_pairs_is_idempotent() {
        let mut list = VerletList::new();
        list.rebuild(vec![(0, 1), (1, 2)], 0.5);
        list.friction_mut()[1] = state(3.0);
        let pairs = list.pairs().to_vec();
        let friction = list.friction().to_vec();

        list.rebuild(pairs.clone(), 0.5);
        list.rebuild(pairs.clone(), 0.5);
        assert_eq!(list.pairs(), pairs.as_slice());
        assert_eq!(list.friction(), friction.as_slice());
    }

    #[test]
    fn margin_runs_out() {
        let mut list = VerletList::new();
        list.rebuild(Vec::new(), 1e-3);
        list.advance(4e-4);
        assert!(!list.needs_rebuild());
        list.advance(7e-4);
        assert!(list.needs_rebuild());
    }
}
