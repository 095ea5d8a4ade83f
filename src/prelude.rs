//! Commonly used imports for convenience.
//!
//! This prelude module provides a convenient way to import the most
//! commonly used types and functions in the refugia library.
//!
//! # Example
//!
//! ```
//! use refugia::prelude::*;
//!
//! let torus = TorusBuilder::new()
//!     .grid(2, 2)
//!     .migration_rate(0.05)
//!     .genotype(Genotype::diploid(0, 0, 1.0).unwrap())
//!     .uniform_densities(vec![0.5])
//!     .build()
//!     .unwrap();
//! assert_eq!(torus.demes().len(), 4);
//! ```

pub use crate::base::{ValidationError, ZeroDensity};
pub use crate::genotype::{Allele, Genotype};
pub use crate::population::{Deme, DemeIndex, Neighbour};
pub use crate::simulation::{
    DemeDensities, LandscapeConfig, RefugeProportions, Scenario, SimulationConfig, TorusBuilder,
    TwoDTorus,
};

// Analysis module re-exports
pub use crate::analysis::{
    allele_frequency_grid, deme_allele_frequency, density_grid, mean_allele_frequency,
};
