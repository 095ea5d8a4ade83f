//! Refugia: a deterministic simulator of resistance evolution in spatially
//! structured pest populations.
//!
//! The model tracks per-genotype population densities (not individuals)
//! across a 2D toroidal grid of demes. Each generation every deme goes
//! through random mating under Hardy-Weinberg expectations, genotype-
//! specific logistic growth, viability selection with an optional
//! untreated refuge, and stepping-stone migration to its four toroidal
//! neighbours.

pub mod analysis;
pub mod base;
pub mod genotype;
pub mod population;
pub mod prelude;
pub mod simulation;

// Re-export commonly used types for convenient external access.
//
// These types form the public, stable surface that most consumers of the
// library will use when setting up and running simulations.
pub use base::{ValidationError, ZeroDensity};
pub use genotype::{Allele, Genotype};
pub use population::{Deme, Neighbour};
pub use simulation::{TorusBuilder, TwoDTorus};
