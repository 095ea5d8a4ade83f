//! Local populations (demes) and the migration edges between them.

mod deme;
mod neighbour;

pub use deme::Deme;
pub use neighbour::{DemeIndex, Neighbour};
