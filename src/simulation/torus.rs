//! The toroidal stepping-stone metapopulation and its generational loop.

use crate::base::{check_range, ValidationError};
use crate::genotype::Genotype;
use crate::population::Deme;
use crate::simulation::RefugeProportions;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One deme's grid coordinates and genotype density vector.
///
/// `x` is the column and `y` the row; densities are parallel to the
/// metapopulation's genotype table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemeDensities {
    /// Column of the deme (0-based)
    pub x: usize,
    /// Row of the deme (0-based)
    pub y: usize,
    /// Per-genotype densities
    pub densities: Vec<f64>,
}

/// A 2-dimensional stepping-stone metapopulation arranged on a torus.
///
/// Demes are stored row-major in an arena; every deme is wired to its
/// left, right, upper and lower neighbours with wrap-around at the grid
/// boundaries, all at one uniform migration rate. The torus drives the
/// per-generation cycle across all demes:
///
/// ```text
/// random_mating -> logistic_growth -> selection -> migration
/// ```
///
/// The structure is fixed after construction; only densities change.
#[derive(Debug, Clone)]
pub struct TwoDTorus {
    /// Number of demes along the x axis
    xlen: usize,
    /// Number of demes along the y axis
    ylen: usize,
    /// Shared, read-only genotype table
    genotypes: Arc<[Genotype]>,
    /// Deme arena, row-major: index = y * xlen + x
    demes: Vec<Deme>,
    /// Completed generations
    generation: usize,
}

impl TwoDTorus {
    /// Create a new toroidal metapopulation.
    ///
    /// `densities` provides one initial per-genotype density vector per
    /// deme, row-major, length `xlen * ylen`. The migration rate applies
    /// uniformly to every edge. Fails on zero grid dimensions, an empty
    /// genotype table, mismatched density lists, or out-of-range rate or
    /// refuge proportions.
    pub fn new(
        xlen: usize,
        ylen: usize,
        genotypes: Vec<Genotype>,
        densities: Vec<Vec<f64>>,
        migration_rate: f64,
        refuge: RefugeProportions,
    ) -> Result<Self, ValidationError> {
        if xlen == 0 {
            return Err(ValidationError::EmptyDimension { axis: "xlen" });
        }
        if ylen == 0 {
            return Err(ValidationError::EmptyDimension { axis: "ylen" });
        }
        if genotypes.is_empty() {
            return Err(ValidationError::EmptyGenotypeList);
        }
        let n_demes = xlen * ylen;
        if densities.len() != n_demes {
            return Err(ValidationError::LengthMismatch {
                what: "initial density lists",
                expected: n_demes,
                actual: densities.len(),
            });
        }
        let migration_rate = check_range("migration_rate", migration_rate, 0.0, 1.0)?;
        let refuge_props = refuge.resolve(n_demes)?;

        let genotypes: Arc<[Genotype]> = genotypes.into();
        let mut demes = Vec::with_capacity(n_demes);
        for (initial, refuge_prop) in densities.into_iter().zip(refuge_props) {
            demes.push(Deme::new(Arc::clone(&genotypes), initial, refuge_prop)?);
        }

        let mut torus = Self {
            xlen,
            ylen,
            genotypes,
            demes,
            generation: 0,
        };
        torus.wire_neighbours(migration_rate)?;
        Ok(torus)
    }

    /// Wire every deme to its four toroidal neighbours
    /// (left, right, up, down).
    fn wire_neighbours(&mut self, migration_rate: f64) -> Result<(), ValidationError> {
        let (xlen, ylen) = (self.xlen, self.ylen);
        for y in 0..ylen {
            for x in 0..xlen {
                let left = self.index((x + xlen - 1) % xlen, y);
                let right = self.index((x + 1) % xlen, y);
                let up = self.index(x, (y + ylen - 1) % ylen);
                let down = self.index(x, (y + 1) % ylen);

                let deme = &mut self.demes[y * xlen + x];
                deme.add_neighbour(left, migration_rate)?;
                deme.add_neighbour(right, migration_rate)?;
                deme.add_neighbour(up, migration_rate)?;
                deme.add_neighbour(down, migration_rate)?;
            }
        }
        Ok(())
    }

    /// Row-major arena index of the deme at column `x`, row `y`.
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.xlen + x
    }

    /// Get the number of demes along the x axis.
    pub fn xlen(&self) -> usize {
        self.xlen
    }

    /// Get the number of demes along the y axis.
    pub fn ylen(&self) -> usize {
        self.ylen
    }

    /// Get the number of completed generations.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Get the shared genotype table.
    pub fn genotypes(&self) -> &[Genotype] {
        &self.genotypes
    }

    /// Get all demes, row-major.
    pub fn demes(&self) -> &[Deme] {
        &self.demes
    }

    /// Get the deme at column `x`, row `y`.
    pub fn deme(&self, x: usize, y: usize) -> Option<&Deme> {
        if x < self.xlen && y < self.ylen {
            self.demes.get(self.index(x, y))
        } else {
            None
        }
    }

    /// Get the summed density of every deme on the grid.
    pub fn total_density(&self) -> f64 {
        self.demes.iter().map(Deme::current_density).sum()
    }

    /// Carry out random mating in each deme.
    pub fn random_mating(&mut self) {
        self.demes.par_iter_mut().for_each(Deme::random_mating);
    }

    /// Carry out logistic population growth in each deme.
    pub fn logistic_growth(&mut self) -> Result<(), ValidationError> {
        self.demes.par_iter_mut().try_for_each(Deme::logistic_growth)
    }

    /// Carry out selection in each deme.
    pub fn selection(&mut self) {
        self.demes.par_iter_mut().for_each(Deme::selection);
    }

    /// Carry out migration between demes.
    ///
    /// Two global phases: every deme fills (and subtracts) its migrant
    /// pools before any deme receives, so every pool is computed from
    /// pre-migration densities across the whole grid. The fill pass is
    /// per-deme independent; delivery runs sequentially after it.
    pub fn migration(&mut self) -> Result<(), ValidationError> {
        self.demes.par_iter_mut().for_each(Deme::fill_migrant_pools);

        for source in 0..self.demes.len() {
            for (target, pool) in self.demes[source].drain_migrant_pools() {
                self.demes[target].receive_migrants(&pool)?;
            }
        }
        Ok(())
    }

    /// Advance the metapopulation by one generation:
    /// mating, growth, selection, then migration.
    pub fn step(&mut self) -> Result<(), ValidationError> {
        self.random_mating();
        self.logistic_growth()?;
        self.selection();
        self.migration()?;
        self.generation += 1;
        Ok(())
    }

    /// Run the generational loop `generations` times.
    pub fn run(&mut self, generations: usize) -> Result<(), ValidationError> {
        for _ in 0..generations {
            self.step()?;
        }
        Ok(())
    }

    /// Get every deme's grid coordinates and genotype density vector,
    /// row-major.
    pub fn genotype_densities(&self) -> Vec<DemeDensities> {
        self.demes
            .iter()
            .enumerate()
            .map(|(i, deme)| DemeDensities {
                x: i % self.xlen,
                y: i / self.xlen,
                densities: deme.densities().to_vec(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_genotypes() -> Vec<Genotype> {
        vec![
            Genotype::diploid(0, 0, 1.0).unwrap(),
            Genotype::diploid(0, 1, 0.5).unwrap(),
            Genotype::diploid(1, 1, 0.1).unwrap(),
        ]
    }

    fn uniform_densities(n_demes: usize) -> Vec<Vec<f64>> {
        vec![vec![0.3, 0.2, 0.1]; n_demes]
    }

    fn test_torus(xlen: usize, ylen: usize, migration_rate: f64) -> TwoDTorus {
        TwoDTorus::new(
            xlen,
            ylen,
            test_genotypes(),
            uniform_densities(xlen * ylen),
            migration_rate,
            RefugeProportions::Uniform(0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_zero_dimensions() {
        let err = TwoDTorus::new(
            0,
            3,
            test_genotypes(),
            vec![],
            0.1,
            RefugeProportions::default(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyDimension { axis: "xlen" });
    }

    #[test]
    fn test_new_rejects_wrong_density_list_count() {
        let err = TwoDTorus::new(
            2,
            2,
            test_genotypes(),
            uniform_densities(3),
            0.1,
            RefugeProportions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::LengthMismatch { .. }));
    }

    #[test]
    fn test_new_rejects_bad_migration_rate() {
        assert!(TwoDTorus::new(
            2,
            2,
            test_genotypes(),
            uniform_densities(4),
            1.5,
            RefugeProportions::default(),
        )
        .is_err());
    }

    #[test]
    fn test_new_rejects_empty_genotypes() {
        assert!(matches!(
            TwoDTorus::new(2, 2, vec![], vec![vec![]; 4], 0.1, RefugeProportions::default()),
            Err(ValidationError::EmptyGenotypeList)
        ));
    }

    #[test]
    fn test_every_deme_has_four_neighbours() {
        let torus = test_torus(3, 2, 0.05);
        for deme in torus.demes() {
            assert_eq!(deme.neighbours().len(), 4);
        }
    }

    #[test]
    fn test_toroidal_adjacency_wraps() {
        // 3 wide, 2 tall. Deme (x=0, y=0) sits at index 0; its edges are
        // added in left, right, up, down order.
        let torus = test_torus(3, 2, 0.05);
        let corner = torus.deme(0, 0).unwrap();
        let targets: Vec<usize> = corner.neighbours().iter().map(|n| n.target()).collect();
        assert_eq!(targets, vec![2, 1, 3, 3]);

        // Deme (x=1, y=1) at index 4: left 3, right 5, up 1, down 1.
        let middle = torus.deme(1, 1).unwrap();
        let targets: Vec<usize> = middle.neighbours().iter().map(|n| n.target()).collect();
        assert_eq!(targets, vec![3, 5, 1, 1]);
    }

    #[test]
    fn test_single_column_wraps_to_itself_horizontally() {
        let torus = test_torus(1, 3, 0.05);
        let deme = torus.deme(0, 1).unwrap();
        let targets: Vec<usize> = deme.neighbours().iter().map(|n| n.target()).collect();
        // left and right both wrap back to the deme itself.
        assert_eq!(targets, vec![1, 1, 0, 2]);
    }

    #[test]
    fn test_deme_lookup_bounds() {
        let torus = test_torus(3, 2, 0.05);
        assert!(torus.deme(2, 1).is_some());
        assert!(torus.deme(3, 0).is_none());
        assert!(torus.deme(0, 2).is_none());
    }

    #[test]
    fn test_migration_conserves_total_density() {
        let mut torus = TwoDTorus::new(
            3,
            3,
            test_genotypes(),
            (0..9)
                .map(|i| vec![0.05 * i as f64, 0.02 * i as f64, 0.01])
                .collect(),
            0.1,
            RefugeProportions::default(),
        )
        .unwrap();

        let before = torus.total_density();
        torus.migration().unwrap();
        assert!((torus.total_density() - before).abs() < 1e-12);
    }

    #[test]
    fn test_migration_moves_density_towards_empty_deme() {
        let genotypes = vec![Genotype::diploid(0, 0, 1.0).unwrap()];
        let mut densities = vec![vec![0.0]; 4];
        densities[0] = vec![0.8];
        let mut torus = TwoDTorus::new(
            2,
            2,
            genotypes,
            densities,
            0.1,
            RefugeProportions::default(),
        )
        .unwrap();

        torus.migration().unwrap();
        // Deme 0 sends 0.08 to each of four edges; on a 2x2 torus its
        // horizontal edges both point at deme 1 and vertical ones at deme 2.
        let report = torus.genotype_densities();
        assert!((report[0].densities[0] - 0.48).abs() < 1e-12);
        assert!((report[1].densities[0] - 0.16).abs() < 1e-12);
        assert!((report[2].densities[0] - 0.16).abs() < 1e-12);
        assert!((report[3].densities[0] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_step_increments_generation() {
        let mut torus = test_torus(2, 2, 0.05);
        assert_eq!(torus.generation(), 0);
        torus.step().unwrap();
        assert_eq!(torus.generation(), 1);
        torus.run(3).unwrap();
        assert_eq!(torus.generation(), 4);
    }

    #[test]
    fn test_genotype_densities_coordinates() {
        let torus = test_torus(3, 2, 0.05);
        let report = torus.genotype_densities();
        assert_eq!(report.len(), 6);
        assert_eq!((report[0].x, report[0].y), (0, 0));
        assert_eq!((report[2].x, report[2].y), (2, 0));
        assert_eq!((report[3].x, report[3].y), (0, 1));
        assert_eq!((report[5].x, report[5].y), (2, 1));
        assert_eq!(report[4].densities, vec![0.3, 0.2, 0.1]);
    }

    #[test]
    fn test_per_deme_refuge_applied_in_order() {
        let genotypes = vec![Genotype::diploid(0, 0, 0.0).unwrap()];
        let mut torus = TwoDTorus::new(
            2,
            1,
            genotypes,
            vec![vec![0.4], vec![0.4]],
            0.0,
            RefugeProportions::PerDeme(vec![1.0, 0.0]),
        )
        .unwrap();

        torus.selection();
        let report = torus.genotype_densities();
        // Full refuge protects deme 0 from the lethal environment.
        assert!((report[0].densities[0] - 0.4).abs() < 1e-12);
        assert_eq!(report[1].densities[0], 0.0);
    }
}
