//! Bivariate tabular distributions.
//!
//! A bivariate distribution is tabulated as a set of secondary univariate
//! distributions attached to the points of a primary grid. The secondary
//! conditional distribution at an arbitrary primary value is obtained by
//! combining the secondary distributions of the two bracketing grid points
//! with a [grid policy](grid::GridPolicy) parametrized by a
//! [two-dimensional interpolation](interpolation::TwoDInterpolation).
//!
//! Two engines are provided:
//!
//! * [`InterpolatedFullyTabularBasicBivariateDistribution`] for general
//!   secondary variables,
//! * [`ElasticBasicBivariateDistribution`] for scattering angle cosines
//!   bounded by a cutoff.
//!
//! All sampling methods take the random number generator as an argument, so
//! that sampling can be replayed with a [`FakeStream`].

// Internal traits.
pub use bivariate::*;
pub use num::*;

// Distributions.
pub use elastic::*;
pub use interpolated::*;

// Random numbers and errors.
pub use error::*;
pub use random::*;

// Modules.
pub mod archive;
mod bivariate;
mod elastic;
mod error;
pub mod grid;
mod interpolated;
pub mod interpolation;
mod num;
mod random;
pub mod search;
pub mod univariate;
