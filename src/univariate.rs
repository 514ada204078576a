//! One-dimensional secondary distributions.
//!
//! The bivariate engines only consume secondary distributions through the
//! object-safe traits of this module, so any tabular distribution can be
//! plugged into a primary grid.

use crate::archive::TabularRecord;
use crate::interpolation::Processing;
use crate::num::Float;
use crate::random::random_number;
use rand_core::RngCore;
use std::borrow::Cow;
use std::fmt::Debug;

pub use tabular::*;
pub use uniform::*;

mod tabular;
mod uniform;

/// One-dimensional distribution.
pub trait UnivariateDistribution<T: Float>: Debug + Send + Sync {
    /// Evaluates the distribution.
    fn evaluate(&self, x: T) -> T;

    /// Evaluates the probability density function.
    fn evaluate_pdf(&self, x: T) -> T;

    /// Evaluates the cumulative distribution function.
    fn evaluate_cdf(&self, x: T) -> T;

    /// Draws a sample.
    fn sample(&self, rng: &mut dyn RngCore) -> T {
        self.sample_with_random_number(random_number(rng))
    }

    /// Returns the sample corresponding to the uniform variate `r` in
    /// `[0, 1)`.
    fn sample_with_random_number(&self, r: T) -> T;

    /// Draws a sample no greater than `max`.
    fn sample_in_subrange(&self, rng: &mut dyn RngCore, max: T) -> T {
        self.sample_with_random_number_in_subrange(random_number(rng), max)
    }

    /// Returns the sample no greater than `max` corresponding to the uniform
    /// variate `r` in `[0, 1)`.
    fn sample_with_random_number_in_subrange(&self, r: T, max: T) -> T;

    /// Lower bound of the support.
    fn lower_bound(&self) -> T;

    /// Upper bound of the support.
    fn upper_bound(&self) -> T;
}

/// One-dimensional distribution defined on a tabulated grid.
pub trait TabularUnivariateDistribution<T: Float>: UnivariateDistribution<T> {
    /// Draws a sample and records the index of the tabulated bin it falls in.
    fn sample_and_record_bin_index(&self, rng: &mut dyn RngCore, bin_index: &mut usize) -> T {
        self.sample_with_random_number_and_record_bin_index(random_number(rng), bin_index)
    }

    /// Returns the sample corresponding to the uniform variate `r` and
    /// records the index of the tabulated bin it falls in.
    fn sample_with_random_number_and_record_bin_index(&self, r: T, bin_index: &mut usize) -> T;

    /// Tabulated grid points, from the lower to the upper bound of the
    /// support.
    fn grid_points(&self) -> Cow<'_, [T]>;

    /// Checks whether the whole support can be processed with the given
    /// processing.
    fn is_compatible_with_interp_type(&self, processing: Processing) -> bool {
        processing.is_in_valid_range(self.lower_bound())
            && processing.is_in_valid_range(self.upper_bound())
    }

    /// Archive record of the distribution.
    fn to_record(&self) -> TabularRecord;
}
