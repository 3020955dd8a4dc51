//! Collision modules: spatial indices, Verlet neighbor lists and the contact kernel.

pub mod bounds;
pub mod contact;
pub mod grid;
pub mod lattice;
pub mod verlet;

pub use bounds::{Bounds, MAX_AXIS_CELLS};
pub use contact::{evaluate, evaluate_slice, ContactBatch, ContactInput, ContactLaw, ContactOutput, ContactSide};
pub use grid::{Grid, CELL_CAPACITY};
pub use lattice::Lattice;
pub use verlet::{FrictionState, Pair, VerletList};
