//! Read-only summaries of metapopulation state.

pub mod frequencies;

pub use frequencies::{
    allele_frequency_grid, deme_allele_frequency, density_grid, mean_allele_frequency,
};
