//! Metapopulation construction and the generational loop.
//!
//! This module provides the toroidal stepping-stone topology, its
//! configuration types, a fluent builder, and scenario-file loading.

pub mod builder;
pub mod initialization;
pub mod parameters;
pub mod torus;

pub use builder::{BuilderError, TorusBuilder};
pub use initialization::{
    initialize_from_file, load_scenario, parse_scenario, DensityInput, GenotypeSpec,
    InitializationError, Scenario,
};
pub use parameters::{LandscapeConfig, RefugeProportions, SimulationConfig};
pub use torus::{DemeDensities, TwoDTorus};
