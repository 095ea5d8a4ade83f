//! Grid-level allele frequency and density summaries.
//!
//! Read-only helpers for inspecting a metapopulation between (or after)
//! generations, e.g. to track the spread of a resistance allele across
//! the landscape. Frequencies are computed from the current densities,
//! not from the demes' cached mating-phase tables, so they are valid at
//! any point in the generational cycle.

use crate::genotype::Allele;
use crate::population::Deme;
use crate::simulation::TwoDTorus;

/// Calculate the frequency of `allele` in a single deme.
///
/// Returns `None` for an extinct deme, where frequencies are undefined.
pub fn deme_allele_frequency(deme: &Deme, allele: Allele) -> Option<f64> {
    let total = deme.current_density();
    if total == 0.0 {
        return None;
    }
    let weighted: f64 = deme
        .genotypes()
        .iter()
        .zip(deme.densities())
        .map(|(g, d)| g.allele_freq(allele) * d)
        .sum();
    Some(weighted / total)
}

/// Calculate the frequency of `allele` in every deme, as a row-major grid
/// of `ylen` rows by `xlen` columns.
///
/// Extinct demes appear as `None`.
pub fn allele_frequency_grid(torus: &TwoDTorus, allele: Allele) -> Vec<Vec<Option<f64>>> {
    torus
        .demes()
        .chunks(torus.xlen())
        .map(|row| {
            row.iter()
                .map(|deme| deme_allele_frequency(deme, allele))
                .collect()
        })
        .collect()
}

/// Calculate every deme's total density, as a row-major grid of `ylen`
/// rows by `xlen` columns.
pub fn density_grid(torus: &TwoDTorus) -> Vec<Vec<f64>> {
    torus
        .demes()
        .chunks(torus.xlen())
        .map(|row| row.iter().map(Deme::current_density).collect())
        .collect()
}

/// Calculate the density-weighted frequency of `allele` across the whole
/// metapopulation.
///
/// Returns `None` if every deme is extinct.
pub fn mean_allele_frequency(torus: &TwoDTorus, allele: Allele) -> Option<f64> {
    let total = torus.total_density();
    if total == 0.0 {
        return None;
    }
    let weighted: f64 = torus
        .demes()
        .iter()
        .map(|deme| {
            deme.genotypes()
                .iter()
                .zip(deme.densities())
                .map(|(g, d)| g.allele_freq(allele) * d)
                .sum::<f64>()
        })
        .sum();
    Some(weighted / total)
}
