//! Initialization of simulations from scenario files.
//!
//! A scenario is a JSON document describing the genotype table, the
//! landscape, the initial densities, and the run settings. This module
//! parses and validates scenarios and builds ready-to-run
//! metapopulations from them.
//!
//! Example scenario:
//!
//! ```json
//! {
//!   "landscape": { "xlen": 10, "ylen": 10, "migration_rate": 0.05, "refuge": 0.2 },
//!   "genotypes": [
//!     { "alleles": [0, 0] },
//!     { "alleles": [0, 1], "fitness": 0.5 },
//!     { "alleles": [1, 1], "fitness": 0.1, "growth_rate": 0.9 }
//!   ],
//!   "densities": [0.8, 0.1, 0.0],
//!   "simulation": { "generations": 200, "snapshot_every": 10 }
//! }
//! ```

use crate::base::ValidationError;
use crate::genotype::{Allele, Genotype};
use crate::simulation::{LandscapeConfig, SimulationConfig, TwoDTorus};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A genotype as written in a scenario file.
///
/// Fitness and the growth parameters default to 1.0 when omitted, like
/// the in-code constructor defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenotypeSpec {
    /// Constituent alleles (any order; canonicalized on build)
    pub alleles: Vec<Allele>,
    /// Relative fitness in the selected environment
    #[serde(default = "default_one")]
    pub fitness: f64,
    /// Intrinsic growth rate
    #[serde(default = "default_one")]
    pub growth_rate: f64,
    /// Genotype-specific maximum density
    #[serde(default = "default_one")]
    pub max_density: f64,
}

fn default_one() -> f64 {
    1.0
}

impl GenotypeSpec {
    /// Build the validated genotype this entry describes.
    pub fn to_genotype(&self) -> Result<Genotype, ValidationError> {
        Genotype::new(
            self.alleles.clone(),
            self.fitness,
            self.growth_rate,
            self.max_density,
        )
    }
}

/// Initial densities as written in a scenario file.
///
/// Either a single per-genotype vector broadcast to every deme, or one
/// vector per deme in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DensityInput {
    /// One density vector for every deme
    Uniform(Vec<f64>),
    /// One density vector per deme, row-major
    PerDeme(Vec<Vec<f64>>),
}

/// A complete simulation scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Grid dimensions, migration rate, refuge layout
    pub landscape: LandscapeConfig,
    /// The genotype table
    pub genotypes: Vec<GenotypeSpec>,
    /// Initial per-deme densities
    pub densities: DensityInput,
    /// Run settings
    pub simulation: SimulationConfig,
}

impl Scenario {
    /// Build a ready-to-run metapopulation from this scenario.
    pub fn build_torus(&self) -> Result<TwoDTorus, ValidationError> {
        let genotypes = self
            .genotypes
            .iter()
            .map(GenotypeSpec::to_genotype)
            .collect::<Result<Vec<_>, _>>()?;

        let densities = match &self.densities {
            DensityInput::Uniform(d) => vec![d.clone(); self.landscape.n_demes()],
            DensityInput::PerDeme(d) => d.clone(),
        };

        TwoDTorus::new(
            self.landscape.xlen,
            self.landscape.ylen,
            genotypes,
            densities,
            self.landscape.migration_rate,
            self.landscape.refuge.clone(),
        )
    }
}

/// Error type for failures when loading a scenario.
#[derive(Debug)]
pub enum InitializationError {
    /// IO error
    Io(std::io::Error),
    /// Parse error
    Parse(String),
    /// Validation error
    Validation(ValidationError),
}

impl std::fmt::Display for InitializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
            Self::Validation(err) => write!(f, "Validation error: {err}"),
        }
    }
}

impl std::error::Error for InitializationError {}

impl From<std::io::Error> for InitializationError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for InitializationError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<ValidationError> for InitializationError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

/// Parse a scenario from a JSON string.
pub fn parse_scenario(input: &str) -> Result<Scenario, InitializationError> {
    Ok(serde_json::from_str(input)?)
}

/// Load a scenario from a JSON file.
pub fn load_scenario(path: impl AsRef<Path>) -> Result<Scenario, InitializationError> {
    let contents = fs::read_to_string(path)?;
    parse_scenario(&contents)
}

/// Load a scenario and build its metapopulation in one step.
pub fn initialize_from_file(
    path: impl AsRef<Path>,
) -> Result<(TwoDTorus, SimulationConfig), InitializationError> {
    let scenario = load_scenario(path)?;
    let torus = scenario.build_torus()?;
    Ok((torus, scenario.simulation))
}
