use crate::base::{check_range, ValidationError};

/// Index of a deme within the metapopulation's arena.
///
/// Neighbour edges name their target by index rather than by reference;
/// the metapopulation that owns the arena resolves the index when
/// delivering migrants. This keeps demes free of shared mutable
/// references to one another.
pub type DemeIndex = usize;

/// A directed migration edge from one deme to another.
///
/// Each generation the edge's transient migrant pool is filled from the
/// source deme's densities scaled by the migration rate, and later drained
/// into the target deme. A `Neighbour` never mutates either deme itself:
/// the source subtracts the pool, the metapopulation delivers it.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbour {
    /// Arena index of the deme migrants are sent to
    target: DemeIndex,
    /// Fraction of each genotype's density emigrating per generation, in [0, 1]
    migration_rate: f64,
    /// Outgoing per-genotype densities; valid only between fill and drain
    migrant_pool: Vec<f64>,
}

impl Neighbour {
    /// Create a new edge to `target` with the given migration rate.
    ///
    /// Fails if `migration_rate` is outside `[0, 1]`.
    pub fn new(target: DemeIndex, migration_rate: f64) -> Result<Self, ValidationError> {
        let migration_rate = check_range("migration_rate", migration_rate, 0.0, 1.0)?;
        Ok(Self {
            target,
            migration_rate,
            migrant_pool: Vec::new(),
        })
    }

    /// Get the arena index of the target deme.
    pub fn target(&self) -> DemeIndex {
        self.target
    }

    /// Get the migration rate along this edge.
    pub fn migration_rate(&self) -> f64 {
        self.migration_rate
    }

    /// Get the current migrant pool.
    ///
    /// Empty outside the window between [`fill_pool`](Self::fill_pool) and
    /// [`take_pool`](Self::take_pool).
    pub fn pool(&self) -> &[f64] {
        &self.migrant_pool
    }

    /// Fill the migrant pool from the source deme's current densities.
    ///
    /// `source_densities` must be the source's pre-emigration density
    /// vector; each entry is scaled by the migration rate.
    pub fn fill_pool(&mut self, source_densities: &[f64]) {
        self.migrant_pool = source_densities
            .iter()
            .map(|d| d * self.migration_rate)
            .collect();
    }

    /// Drain the migrant pool, leaving it empty.
    ///
    /// Pools must be drained before the next migration phase begins so no
    /// stale densities are re-sent.
    pub fn take_pool(&mut self) -> Vec<f64> {
        std::mem::take(&mut self.migrant_pool)
    }
}
