use crate::base::{check_range, ValidationError, ZeroDensity};
use crate::population::{DemeIndex, Neighbour};
use crate::genotype::{Allele, Genotype};
use std::sync::Arc;

/// A spatially localized subpopulation tracking one density per genotype.
///
/// A deme holds a reference to the shared genotype table and a mutable
/// density vector with the same index correspondence: `densities[i]` is
/// the density of `genotypes[i]`. The generational phases mutate densities
/// in place and must be driven in the order
///
/// ```text
/// random_mating -> logistic_growth -> selection -> migration
/// ```
///
/// for biologically meaningful results. This ordering is a caller
/// contract (the metapopulation honours it), not a runtime-checked state
/// machine.
///
/// Total density is only bounded by 1.0 at construction; growth and
/// migration may move it afterwards.
#[derive(Debug, Clone)]
pub struct Deme {
    /// Shared, read-only genotype table
    genotypes: Arc<[Genotype]>,
    /// Per-genotype densities, parallel to `genotypes`
    densities: Vec<f64>,
    /// Allele frequencies indexed directly by allele identifier
    allele_freqs: Vec<f64>,
    /// Fraction of the deme exempt from selection, in [0, 1]
    refuge_proportion: f64,
    /// Outgoing migration edges
    neighbours: Vec<Neighbour>,
}

impl Deme {
    /// Create a new deme.
    ///
    /// `densities` must be parallel to `genotypes` and sum to at most 1.0;
    /// `refuge_proportion` must lie in `[0, 1]`. The allele-frequency
    /// table is sized by the largest allele identifier in the genotype
    /// table and populated immediately (unless the deme starts empty, in
    /// which case it stays at zero).
    pub fn new(
        genotypes: Arc<[Genotype]>,
        densities: Vec<f64>,
        refuge_proportion: f64,
    ) -> Result<Self, ValidationError> {
        if genotypes.is_empty() {
            return Err(ValidationError::EmptyGenotypeList);
        }
        if densities.len() != genotypes.len() {
            return Err(ValidationError::LengthMismatch {
                what: "genotype densities",
                expected: genotypes.len(),
                actual: densities.len(),
            });
        }
        for &d in &densities {
            check_range("genotype density", d, 0.0, 1.0)?;
        }
        let total: f64 = densities.iter().sum();
        check_range("total density", total, 0.0, 1.0)?;
        let refuge_proportion = check_range("refuge_proportion", refuge_proportion, 0.0, 1.0)?;

        let n_alleles = genotypes
            .iter()
            .map(|g| g.max_allele() as usize + 1)
            .max()
            .unwrap_or(0);

        let mut deme = Self {
            genotypes,
            densities,
            allele_freqs: vec![0.0; n_alleles],
            refuge_proportion,
            neighbours: Vec::new(),
        };
        deme.update_allele_freqs();
        Ok(deme)
    }

    /// Get the shared genotype table.
    pub fn genotypes(&self) -> &[Genotype] {
        &self.genotypes
    }

    /// Get the per-genotype densities.
    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    /// Get the refuge proportion.
    pub fn refuge_proportion(&self) -> f64 {
        self.refuge_proportion
    }

    /// Get the outgoing migration edges.
    pub fn neighbours(&self) -> &[Neighbour] {
        &self.neighbours
    }

    /// Get the total population density.
    pub fn current_density(&self) -> f64 {
        self.densities.iter().sum()
    }

    /// Check whether this deme is extinct (zero total density).
    pub fn is_empty(&self) -> bool {
        self.current_density() == 0.0
    }

    /// Get the relative frequency of each genotype.
    ///
    /// Fails with [`ZeroDensity`] if the deme is empty; frequencies are
    /// undefined there.
    pub fn genotype_freqs(&self) -> Result<Vec<f64>, ZeroDensity> {
        let total = self.current_density();
        if total == 0.0 {
            return Err(ZeroDensity);
        }
        Ok(self.densities.iter().map(|d| d / total).collect())
    }

    /// Get the last computed frequency of the given allele.
    ///
    /// Frequencies reflect the most recent [`update_allele_freqs`]
    /// (`random_mating` refreshes them). Returns 0.0 for alleles absent
    /// from the genotype table.
    pub fn allele_freq(&self, allele: Allele) -> f64 {
        self.allele_freqs.get(allele as usize).copied().unwrap_or(0.0)
    }

    /// Get the full allele-frequency table, indexed by allele identifier.
    pub fn allele_freqs(&self) -> &[f64] {
        &self.allele_freqs
    }

    /// Recompute allele frequencies from the current genotype frequencies.
    ///
    /// For every allele, sums each genotype's within-genotype allele
    /// frequency weighted by the genotype's relative frequency in the
    /// deme. A no-op on an empty deme (absorbing state).
    pub fn update_allele_freqs(&mut self) {
        let total = self.current_density();
        if total == 0.0 {
            return;
        }
        for a in 0..self.allele_freqs.len() {
            let mut freq = 0.0;
            for (g, d) in self.genotypes.iter().zip(&self.densities) {
                freq += g.allele_freq(a as Allele) * (d / total);
            }
            self.allele_freqs[a] = freq;
        }
    }

    /// Carry out one round of random mating.
    ///
    /// Allele frequencies are refreshed, then each genotype's new relative
    /// frequency follows Hardy-Weinberg expectations: `p^2` for a
    /// homozygote, `2pq` for a heterozygote. The result is scaled by the
    /// pre-mating total so mating conserves total density.
    ///
    /// Assumes diploid genotypes; only the first two alleles of each
    /// genotype participate. A no-op on an empty deme.
    pub fn random_mating(&mut self) {
        let total = self.current_density();
        if total == 0.0 {
            return;
        }
        self.update_allele_freqs();
        for (g, d) in self.genotypes.iter().zip(self.densities.iter_mut()) {
            let a = g.alleles();
            let p = self.allele_freqs[a[0] as usize];
            let freq = if a[0] == a[1] {
                p * p
            } else {
                2.0 * p * self.allele_freqs[a[1] as usize]
            };
            *d = freq * total;
        }
    }

    /// Grow each genotype according to its logistic map.
    ///
    /// Every genotype sees the same total-density snapshot taken at the
    /// start of the phase, not a running total. A no-op on an empty deme;
    /// fails if the snapshot exceeds the map's `0 < N <= 1` contract.
    pub fn logistic_growth(&mut self) -> Result<(), ValidationError> {
        let total = self.current_density();
        if total == 0.0 {
            return Ok(());
        }
        for (g, d) in self.genotypes.iter().zip(self.densities.iter_mut()) {
            *d = g.logistic_growth(*d, total)?;
        }
        Ok(())
    }

    /// Apply viability selection.
    ///
    /// Each genotype's density is split into a selected fraction
    /// (`1 - refuge_proportion`), which is multiplied by the genotype's
    /// fitness, and a refuge fraction, which escapes selection entirely.
    pub fn selection(&mut self) {
        let refuge = self.refuge_proportion;
        for (g, d) in self.genotypes.iter().zip(self.densities.iter_mut()) {
            let selected = *d * (1.0 - refuge) * g.fitness();
            let unselected = *d * refuge;
            *d = selected + unselected;
        }
    }

    /// Add a migration edge to the deme at arena index `target`.
    ///
    /// Fails if `migration_rate` is outside `[0, 1]`.
    pub fn add_neighbour(
        &mut self,
        target: DemeIndex,
        migration_rate: f64,
    ) -> Result<(), ValidationError> {
        self.neighbours.push(Neighbour::new(target, migration_rate)?);
        Ok(())
    }

    /// Add incoming migrant densities element-wise.
    ///
    /// `migrants` must be parallel to this deme's density vector.
    pub fn receive_migrants(&mut self, migrants: &[f64]) -> Result<(), ValidationError> {
        if migrants.len() != self.densities.len() {
            return Err(ValidationError::LengthMismatch {
                what: "migrant densities",
                expected: self.densities.len(),
                actual: migrants.len(),
            });
        }
        for (d, m) in self.densities.iter_mut().zip(migrants) {
            *d += m;
        }
        Ok(())
    }

    /// Fill the migrant pools of every neighbour edge.
    ///
    /// Two passes: first every pool is computed from this deme's
    /// pre-emigration densities, then every pool is subtracted. Emigration
    /// to one neighbour therefore never affects the amount available to
    /// emigrate to the next.
    pub fn fill_migrant_pools(&mut self) {
        for n in self.neighbours.iter_mut() {
            n.fill_pool(&self.densities);
        }
        for n in self.neighbours.iter() {
            for (d, m) in self.densities.iter_mut().zip(n.pool()) {
                *d -= m;
            }
        }
    }

    /// Drain every neighbour's migrant pool for delivery.
    ///
    /// Returns `(target, pool)` pairs and leaves all pools empty, so
    /// nothing stale can carry into the next migration phase. The caller
    /// (the metapopulation) resolves the target indices.
    pub fn drain_migrant_pools(&mut self) -> Vec<(DemeIndex, Vec<f64>)> {
        self.neighbours
            .iter_mut()
            .map(|n| (n.target(), n.take_pool()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_genotypes() -> Arc<[Genotype]> {
        vec![
            Genotype::diploid(0, 0, 1.0).unwrap(),
            Genotype::diploid(0, 1, 1.0).unwrap(),
            Genotype::diploid(1, 1, 1.0).unwrap(),
        ]
        .into()
    }

    #[test]
    fn test_deme_new_validates_lengths() {
        let err = Deme::new(three_genotypes(), vec![0.4, 0.4], 0.0).unwrap_err();
        assert_eq!(
            err,
            ValidationError::LengthMismatch {
                what: "genotype densities",
                expected: 3,
                actual: 2,
            }
        );
    }

    #[test]
    fn test_deme_new_rejects_excess_density() {
        assert!(Deme::new(three_genotypes(), vec![0.5, 0.5, 0.5], 0.0).is_err());
    }

    #[test]
    fn test_deme_new_rejects_bad_refuge() {
        assert!(Deme::new(three_genotypes(), vec![0.2, 0.2, 0.2], 1.5).is_err());
        assert!(Deme::new(three_genotypes(), vec![0.2, 0.2, 0.2], -0.1).is_err());
    }

    #[test]
    fn test_deme_new_rejects_empty_genotype_list() {
        let genotypes: Arc<[Genotype]> = Vec::new().into();
        assert!(matches!(
            Deme::new(genotypes, vec![], 0.0),
            Err(ValidationError::EmptyGenotypeList)
        ));
    }

    #[test]
    fn test_current_density() {
        let deme = Deme::new(three_genotypes(), vec![0.4, 0.4, 0.1], 0.0).unwrap();
        assert!((deme.current_density() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_genotype_freqs() {
        let deme = Deme::new(three_genotypes(), vec![0.4, 0.4, 0.0], 0.0).unwrap();
        let freqs = deme.genotype_freqs().unwrap();
        assert!((freqs[0] - 0.5).abs() < 1e-12);
        assert!((freqs[1] - 0.5).abs() < 1e-12);
        assert_eq!(freqs[2], 0.0);
    }

    #[test]
    fn test_genotype_freqs_empty_deme() {
        let deme = Deme::new(three_genotypes(), vec![0.0, 0.0, 0.0], 0.0).unwrap();
        assert_eq!(deme.genotype_freqs(), Err(ZeroDensity));
    }

    #[test]
    fn test_allele_freqs_at_construction() {
        // Densities 0.4 / 0.4 over {0/0, 0/1}: p(0) = 0.75, p(1) = 0.25.
        let deme = Deme::new(three_genotypes(), vec![0.4, 0.4, 0.0], 0.0).unwrap();
        assert!((deme.allele_freq(0) - 0.75).abs() < 1e-12);
        assert!((deme.allele_freq(1) - 0.25).abs() < 1e-12);
        // Unknown alleles report zero frequency.
        assert_eq!(deme.allele_freq(7), 0.0);
    }

    #[test]
    fn test_random_mating_hardy_weinberg() {
        let mut deme = Deme::new(three_genotypes(), vec![0.4, 0.4, 0.0], 0.0).unwrap();
        deme.random_mating();
        // p = 0.75, q = 0.25, total 0.8:
        // 0/0 -> p^2 * 0.8 = 0.45, 0/1 -> 2pq * 0.8 = 0.3, 1/1 -> q^2 * 0.8 = 0.05
        let d = deme.densities();
        assert!((d[0] - 0.45).abs() < 1e-12);
        assert!((d[1] - 0.30).abs() < 1e-12);
        assert!((d[2] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_random_mating_conserves_density() {
        let mut deme = Deme::new(three_genotypes(), vec![0.31, 0.17, 0.26], 0.3).unwrap();
        let before = deme.current_density();
        deme.random_mating();
        assert!((deme.current_density() - before).abs() < 1e-12);
    }

    #[test]
    fn test_random_mating_empty_deme_is_noop() {
        let mut deme = Deme::new(three_genotypes(), vec![0.0, 0.0, 0.0], 0.0).unwrap();
        deme.random_mating();
        assert!(deme.is_empty());
    }

    #[test]
    fn test_logistic_growth_uses_snapshot_total() {
        // r = 1, K = 1 for all genotypes, N = 0.4 -> lambda = 1.6 for every
        // genotype, regardless of update order.
        let mut deme = Deme::new(three_genotypes(), vec![0.1, 0.1, 0.2], 0.0).unwrap();
        deme.logistic_growth().unwrap();
        let d = deme.densities();
        assert!((d[0] - 0.16).abs() < 1e-12);
        assert!((d[1] - 0.16).abs() < 1e-12);
        assert!((d[2] - 0.32).abs() < 1e-12);
    }

    #[test]
    fn test_logistic_growth_empty_deme_is_noop() {
        let mut deme = Deme::new(three_genotypes(), vec![0.0, 0.0, 0.0], 0.0).unwrap();
        assert!(deme.logistic_growth().is_ok());
        assert!(deme.is_empty());
    }

    #[test]
    fn test_selection_example() {
        // Worked example: {0/0 fitness 1.0, 0/1 fitness 0.5},
        // densities 0.4 / 0.4, no refuge: 0/0 stays, 0/1 halves.
        let genotypes: Arc<[Genotype]> = vec![
            Genotype::diploid(0, 0, 1.0).unwrap(),
            Genotype::diploid(0, 1, 0.5).unwrap(),
        ]
        .into();
        let mut deme = Deme::new(genotypes, vec![0.4, 0.4], 0.0).unwrap();
        deme.selection();
        let d = deme.densities();
        assert!((d[0] - 0.4).abs() < 1e-12);
        assert!((d[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_selection_full_refuge_is_identity() {
        let genotypes: Arc<[Genotype]> = vec![
            Genotype::diploid(0, 0, 0.1).unwrap(),
            Genotype::diploid(0, 1, 0.5).unwrap(),
        ]
        .into();
        let mut deme = Deme::new(genotypes, vec![0.3, 0.3], 1.0).unwrap();
        deme.selection();
        assert_eq!(deme.densities(), &[0.3, 0.3]);
    }

    #[test]
    fn test_selection_neutral_fitness_is_identity() {
        let mut deme = Deme::new(three_genotypes(), vec![0.3, 0.3, 0.1], 0.0).unwrap();
        deme.selection();
        assert_eq!(deme.densities(), &[0.3, 0.3, 0.1]);
    }

    #[test]
    fn test_partial_refuge_protects_fraction() {
        // fitness 0, refuge 0.25: exactly the refuge fraction survives.
        let genotypes: Arc<[Genotype]> = vec![Genotype::diploid(0, 0, 0.0).unwrap()].into();
        let mut deme = Deme::new(genotypes, vec![0.8], 0.25).unwrap();
        deme.selection();
        assert!((deme.densities()[0] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_receive_migrants() {
        let mut deme = Deme::new(three_genotypes(), vec![0.1, 0.2, 0.3], 0.0).unwrap();
        deme.receive_migrants(&[0.05, 0.0, 0.01]).unwrap();
        let d = deme.densities();
        assert!((d[0] - 0.15).abs() < 1e-12);
        assert!((d[1] - 0.2).abs() < 1e-12);
        assert!((d[2] - 0.31).abs() < 1e-12);
    }

    #[test]
    fn test_receive_migrants_length_mismatch() {
        let mut deme = Deme::new(three_genotypes(), vec![0.1, 0.2, 0.3], 0.0).unwrap();
        assert!(deme.receive_migrants(&[0.05, 0.0]).is_err());
    }

    #[test]
    fn test_fill_migrant_pools_subtracts_pool() {
        let genotypes: Arc<[Genotype]> = vec![
            Genotype::diploid(0, 0, 1.0).unwrap(),
            Genotype::diploid(0, 1, 1.0).unwrap(),
        ]
        .into();
        let mut deme = Deme::new(genotypes, vec![0.5, 0.3], 0.0).unwrap();
        deme.add_neighbour(1, 0.1).unwrap();
        deme.fill_migrant_pools();

        let pool = deme.neighbours()[0].pool();
        assert!((pool[0] - 0.05).abs() < 1e-12);
        assert!((pool[1] - 0.03).abs() < 1e-12);
        let d = deme.densities();
        assert!((d[0] - 0.45).abs() < 1e-12);
        assert!((d[1] - 0.27).abs() < 1e-12);
    }

    #[test]
    fn test_fill_migrant_pools_two_pass_no_depletion_bias() {
        // Two neighbours at the same rate must receive identical pools,
        // both computed from the pre-emigration densities.
        let genotypes: Arc<[Genotype]> = vec![Genotype::diploid(0, 0, 1.0).unwrap()].into();
        let mut deme = Deme::new(genotypes, vec![0.8], 0.0).unwrap();
        deme.add_neighbour(1, 0.25).unwrap();
        deme.add_neighbour(2, 0.25).unwrap();
        deme.fill_migrant_pools();

        assert!((deme.neighbours()[0].pool()[0] - 0.2).abs() < 1e-12);
        assert!((deme.neighbours()[1].pool()[0] - 0.2).abs() < 1e-12);
        assert!((deme.densities()[0] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_drain_migrant_pools_empties_all() {
        let genotypes: Arc<[Genotype]> = vec![Genotype::diploid(0, 0, 1.0).unwrap()].into();
        let mut deme = Deme::new(genotypes, vec![0.8], 0.0).unwrap();
        deme.add_neighbour(4, 0.5).unwrap();
        deme.fill_migrant_pools();

        let pools = deme.drain_migrant_pools();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].0, 4);
        assert!((pools[0].1[0] - 0.4).abs() < 1e-12);
        assert!(deme.neighbours()[0].pool().is_empty());
    }
}
