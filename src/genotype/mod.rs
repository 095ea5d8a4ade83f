//! Genotypes and their fitness and growth parameters.
//!
//! A genotype is a combination of integer-identified alleles together with
//! the parameters describing how it fares under selection and crowding:
//! its relative fitness in the selected environment (e.g. exposure to a
//! toxin-expressing crop), its intrinsic growth rate, and the maximum
//! density it can sustain. The latter two can model fitness costs of an
//! otherwise favoured resistance genotype.

use crate::base::{check_range, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer identifier of a genetic variant.
///
/// Allele identifiers are expected to be dense (0, 1, 2, ...) because
/// demes index their allele-frequency table directly by identifier.
pub type Allele = u32;

/// An immutable genotype: a sorted combination of alleles plus fitness and
/// growth parameters.
///
/// Alleles are kept sorted so that two genotypes built from the same
/// alleles in any order compare and display identically. Typically there
/// are two alleles (diploid organisms); the deme-level mating operator
/// assumes exactly that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    /// Constituent alleles, sorted ascending
    alleles: Vec<Allele>,
    /// Relative fitness in the selected environment, in [0, 1]
    fitness: f64,
    /// Intrinsic growth rate, non-negative
    growth_rate: f64,
    /// Genotype-specific carrying capacity, in (0, 1]
    max_density: f64,
}

impl Genotype {
    /// Create a new genotype.
    ///
    /// Alleles are canonicalized by sorting. Fails if the allele list is
    /// empty, `fitness` is outside `[0, 1]`, `growth_rate` is negative, or
    /// `max_density` is outside `(0, 1]`.
    pub fn new(
        mut alleles: Vec<Allele>,
        fitness: f64,
        growth_rate: f64,
        max_density: f64,
    ) -> Result<Self, ValidationError> {
        if alleles.is_empty() {
            return Err(ValidationError::EmptyAlleles);
        }
        alleles.sort_unstable();
        let fitness = check_range("fitness", fitness, 0.0, 1.0)?;
        let growth_rate = check_range("growth_rate", growth_rate, 0.0, f64::INFINITY)?;
        if !(max_density > 0.0 && max_density <= 1.0) {
            return Err(ValidationError::OutOfRange {
                name: "max_density",
                value: max_density,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self {
            alleles,
            fitness,
            growth_rate,
            max_density,
        })
    }

    /// Create a diploid genotype with default growth parameters
    /// (growth rate 1.0, maximum density 1.0).
    pub fn diploid(a: Allele, b: Allele, fitness: f64) -> Result<Self, ValidationError> {
        Self::new(vec![a, b], fitness, 1.0, 1.0)
    }

    /// Get the constituent alleles (sorted ascending).
    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    /// Get the number of alleles in this genotype.
    pub fn ploidy(&self) -> usize {
        self.alleles.len()
    }

    /// Get the largest allele identifier in this genotype.
    pub fn max_allele(&self) -> Allele {
        // Safe: construction rejects empty allele lists
        *self.alleles.last().unwrap()
    }

    /// Check whether every allele in this genotype is identical.
    pub fn is_homozygous(&self) -> bool {
        self.alleles.iter().all(|&a| a == self.alleles[0])
    }

    /// Get the relative fitness in the selected environment.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Get the intrinsic growth rate.
    pub fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    /// Get the genotype-specific maximum density.
    pub fn max_density(&self) -> f64 {
        self.max_density
    }

    /// Count the copies of the specified allele in this genotype.
    pub fn allele_count(&self, allele: Allele) -> usize {
        self.alleles.iter().filter(|&&a| a == allele).count()
    }

    /// Get the within-genotype frequency of the specified allele.
    ///
    /// For the diploid genotype 0/1, the frequency of allele 1 is 0.5.
    pub fn allele_freq(&self, allele: Allele) -> f64 {
        self.allele_count(allele) as f64 / self.ploidy() as f64
    }

    /// Calculate the next-generation density of this genotype under the
    /// discrete logistic map
    ///
    /// ```text
    /// D(t+1) = lambda * D(t),    lambda = 1 + r - (r / K) * N
    /// ```
    ///
    /// where `r` is the genotype's growth rate, `K` its maximum density,
    /// and `N` the *total* density of the surrounding deme. Fails unless
    /// `0 < total_density <= 1`.
    pub fn logistic_growth(&self, density: f64, total_density: f64) -> Result<f64, ValidationError> {
        if !(total_density > 0.0 && total_density <= 1.0) {
            return Err(ValidationError::OutOfRange {
                name: "total_density",
                value: total_density,
                min: 0.0,
                max: 1.0,
            });
        }
        let lambda = 1.0 + self.growth_rate - (self.growth_rate / self.max_density) * total_density;
        Ok(density * lambda)
    }
}

impl fmt::Display for Genotype {
    /// Genotypes display as their alleles separated by slashes, e.g. "0/1".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, allele) in self.alleles.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{allele}")?;
        }
        Ok(())
    }
}
