//! Foundational types shared across the crate.
//!
//! This module provides the typed errors used by every layer of the
//! simulator.

mod errors;

pub use errors::{ValidationError, ZeroDensity};

pub(crate) use errors::check_range;
