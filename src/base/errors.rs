use std::error;
use std::fmt;

/// Error returned when a construction- or call-time contract is violated.
///
/// All validation in this crate is fail-fast: a `ValidationError` is
/// returned immediately and never recovered internally. It signals a
/// programming error in the caller (an out-of-range rate, mismatched
/// parallel vectors, a degenerate grid), not a transient fault.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A numeric parameter fell outside its permitted interval.
    OutOfRange {
        /// Name of the offending parameter
        name: &'static str,
        /// The rejected value
        value: f64,
        /// Inclusive lower bound
        min: f64,
        /// Upper bound (inclusive; `f64::INFINITY` for unbounded)
        max: f64,
    },

    /// Two parallel sequences disagreed in length.
    LengthMismatch {
        /// What was being matched (e.g. "migrant densities")
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// A genotype was constructed with no alleles.
    EmptyAlleles,

    /// A deme or metapopulation was constructed with no genotypes.
    EmptyGenotypeList,

    /// A grid dimension was zero.
    EmptyDimension {
        /// The axis that was zero ("xlen" or "ylen")
        axis: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                name,
                value,
                min,
                max,
            } => write!(f, "{name} = {value} outside [{min}, {max}]"),
            Self::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(
                f,
                "Length mismatch for {what}: expected {expected}, got {actual}"
            ),
            Self::EmptyAlleles => write!(f, "Genotype must have at least one allele"),
            Self::EmptyGenotypeList => write!(f, "Genotype list must not be empty"),
            Self::EmptyDimension { axis } => {
                write!(f, "Grid dimension {axis} must be at least 1")
            }
        }
    }
}

impl error::Error for ValidationError {}

/// Error returned when genotype frequencies are requested from a deme with
/// zero total density.
///
/// An empty deme is an absorbing state: the generational phases simply
/// leave it untouched, but an explicit frequency read has no defined
/// answer, so it surfaces this error instead of dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroDensity;

impl fmt::Display for ZeroDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Genotype frequencies are undefined at zero total density")
    }
}

impl error::Error for ZeroDensity {}

/// Check that a value lies in `[min, max]`, returning it on success.
pub(crate) fn check_range(
    name: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, ValidationError> {
    if value >= min && value <= max {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}
