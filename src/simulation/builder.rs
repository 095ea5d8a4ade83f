//! Builder pattern for creating metapopulations.
//!
//! Provides a fluent API for configuring and creating a [`TwoDTorus`]
//! with sensible defaults and build-time validation.

use crate::base::ValidationError;
use crate::genotype::Genotype;
use crate::simulation::{RefugeProportions, TwoDTorus};
use std::error;
use std::fmt;

/// Builder for constructing [`TwoDTorus`] instances with a fluent API.
///
/// # Examples
///
/// ```
/// use refugia::genotype::Genotype;
/// use refugia::simulation::TorusBuilder;
///
/// let torus = TorusBuilder::new()
///     .grid(4, 4)
///     .migration_rate(0.05)
///     .genotype(Genotype::diploid(0, 0, 1.0).unwrap())
///     .genotype(Genotype::diploid(0, 1, 0.5).unwrap())
///     .uniform_densities(vec![0.4, 0.4])
///     .refuge_proportion(0.2)
///     .build()
///     .unwrap();
///
/// assert_eq!(torus.demes().len(), 16);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TorusBuilder {
    // Required parameters
    xlen: Option<usize>,
    ylen: Option<usize>,
    migration_rate: Option<f64>,

    // Genotype table and initial densities
    genotypes: Vec<Genotype>,
    densities: DensityInit,

    // Refuge layout (default: no refuge anywhere)
    refuge: RefugeProportions,
}

/// How initial densities are laid out across the grid.
#[derive(Debug, Clone, Default)]
enum DensityInit {
    #[default]
    Unset,
    /// One density vector broadcast to every deme
    Uniform(Vec<f64>),
    /// One density vector per deme, row-major
    PerDeme(Vec<Vec<f64>>),
}

/// Error type for failures when building a metapopulation.
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderError {
    /// A required builder field was never set.
    MissingRequired(&'static str),
    /// A supplied parameter failed validation.
    Invalid(ValidationError),
}

impl fmt::Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired(field) => write!(f, "Missing required parameter: {field}"),
            Self::Invalid(err) => write!(f, "Invalid parameter: {err}"),
        }
    }
}

impl error::Error for BuilderError {}

impl From<ValidationError> for BuilderError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

impl TorusBuilder {
    /// Create a new builder with nothing configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grid dimensions.
    pub fn grid(mut self, xlen: usize, ylen: usize) -> Self {
        self.xlen = Some(xlen);
        self.ylen = Some(ylen);
        self
    }

    /// Set the uniform migration rate between adjacent demes.
    pub fn migration_rate(mut self, rate: f64) -> Self {
        self.migration_rate = Some(rate);
        self
    }

    /// Append one genotype to the genotype table.
    pub fn genotype(mut self, genotype: Genotype) -> Self {
        self.genotypes.push(genotype);
        self
    }

    /// Replace the genotype table.
    pub fn genotypes(mut self, genotypes: Vec<Genotype>) -> Self {
        self.genotypes = genotypes;
        self
    }

    /// Give every deme the same initial density vector
    /// (parallel to the genotype table).
    pub fn uniform_densities(mut self, densities: Vec<f64>) -> Self {
        self.densities = DensityInit::Uniform(densities);
        self
    }

    /// Set explicit per-deme initial density vectors, row-major.
    pub fn densities(mut self, densities: Vec<Vec<f64>>) -> Self {
        self.densities = DensityInit::PerDeme(densities);
        self
    }

    /// Give every deme the same refuge proportion.
    pub fn refuge_proportion(mut self, proportion: f64) -> Self {
        self.refuge = RefugeProportions::Uniform(proportion);
        self
    }

    /// Set explicit per-deme refuge proportions, row-major.
    pub fn refuge_proportions(mut self, proportions: Vec<f64>) -> Self {
        self.refuge = RefugeProportions::PerDeme(proportions);
        self
    }

    /// Build the metapopulation, validating all parameters.
    pub fn build(self) -> Result<TwoDTorus, BuilderError> {
        let xlen = self.xlen.ok_or(BuilderError::MissingRequired("grid"))?;
        let ylen = self.ylen.ok_or(BuilderError::MissingRequired("grid"))?;
        let migration_rate = self
            .migration_rate
            .ok_or(BuilderError::MissingRequired("migration_rate"))?;

        let densities = match self.densities {
            DensityInit::Unset => return Err(BuilderError::MissingRequired("densities")),
            DensityInit::Uniform(d) => vec![d; xlen * ylen],
            DensityInit::PerDeme(d) => d,
        };

        let torus = TwoDTorus::new(
            xlen,
            ylen,
            self.genotypes,
            densities,
            migration_rate,
            self.refuge,
        )?;
        Ok(torus)
    }
}
