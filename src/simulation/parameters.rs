//! Simulation parameters and configuration.
//!
//! Plain serde-derived configuration types for describing the landscape
//! (grid dimensions, migration, refuge layout) and the run settings.
//! Validation happens when a metapopulation is built from them.

use crate::base::{check_range, ValidationError};
use serde::{Deserialize, Serialize};

/// Refuge proportions across the grid.
///
/// Either a single proportion broadcast to every deme, or an explicit
/// per-deme list in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefugeProportions {
    /// The same refuge proportion for every deme
    Uniform(f64),
    /// One refuge proportion per deme, row-major, length `xlen * ylen`
    PerDeme(Vec<f64>),
}

impl Default for RefugeProportions {
    fn default() -> Self {
        Self::Uniform(0.0)
    }
}

impl RefugeProportions {
    /// Expand to one validated proportion per deme.
    ///
    /// Fails if any proportion is outside `[0, 1]` or a per-deme list does
    /// not match the number of demes.
    pub fn resolve(&self, n_demes: usize) -> Result<Vec<f64>, ValidationError> {
        match self {
            Self::Uniform(r) => {
                let r = check_range("refuge_proportion", *r, 0.0, 1.0)?;
                Ok(vec![r; n_demes])
            }
            Self::PerDeme(props) => {
                if props.len() != n_demes {
                    return Err(ValidationError::LengthMismatch {
                        what: "refuge proportions",
                        expected: n_demes,
                        actual: props.len(),
                    });
                }
                for &r in props {
                    check_range("refuge_proportion", r, 0.0, 1.0)?;
                }
                Ok(props.clone())
            }
        }
    }
}

/// Landscape layout: grid dimensions, migration rate, refuge placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandscapeConfig {
    /// Number of demes along the x axis
    pub xlen: usize,
    /// Number of demes along the y axis
    pub ylen: usize,
    /// Uniform migration rate between adjacent demes, in [0, 1]
    pub migration_rate: f64,
    /// Refuge proportions (defaults to no refuge anywhere)
    #[serde(default)]
    pub refuge: RefugeProportions,
}

impl LandscapeConfig {
    /// Create a landscape with uniform refuge.
    pub fn new(xlen: usize, ylen: usize, migration_rate: f64, refuge_proportion: f64) -> Self {
        Self {
            xlen,
            ylen,
            migration_rate,
            refuge: RefugeProportions::Uniform(refuge_proportion),
        }
    }

    /// Total number of demes on this landscape.
    pub fn n_demes(&self) -> usize {
        self.xlen * self.ylen
    }
}

/// High-level run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of generations to simulate
    pub generations: usize,
    /// Record a density snapshot every this many generations
    /// (`None` = only the final state)
    #[serde(default)]
    pub snapshot_every: Option<usize>,
}

impl SimulationConfig {
    /// Create new run settings.
    pub fn new(generations: usize, snapshot_every: Option<usize>) -> Self {
        Self {
            generations,
            snapshot_every,
        }
    }
}
