//! Bivariate distribution abstractions and the primary grid data model.

use crate::archive::{BivariateRecord, TabularRecord};
use crate::error::{ArchiveError, ConstructionError, SamplingError};
use crate::grid::Bin;
use crate::num::Float;
use crate::search::{find_lower_bin_index, find_lower_bin_index_including_upper_bound};
use crate::univariate::TabularUnivariateDistribution;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Maximum number of iterations of the correlated CDF estimators.
pub const MAX_ITERATIONS: usize = 500;

/// Numerical tolerances of the interpolation schemes.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Relative tolerance applied to secondary grid limits, within which
    /// secondary values are snapped onto the limits.
    pub fuzzy_boundary: f64,
    /// Relative error tolerance of the correlated CDF estimators.
    pub relative_error: f64,
    /// Absolute error tolerance of the correlated CDF estimators, used when
    /// the relative error is undefined.
    pub error: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            fuzzy_boundary: 1e-3,
            relative_error: 1e-7,
            error: 1e-15,
        }
    }
}

/// Bivariate distribution.
pub trait BivariateDistribution<T: Float>: Debug + Send + Sync {
    /// Checks whether the primary dimension is tabular.
    fn is_primary_dimension_tabular(&self) -> bool;

    /// Checks whether the primary dimension is continuous.
    fn is_primary_dimension_continuous(&self) -> bool;

    /// Lower bound of the primary independent variable.
    fn lower_bound_of_primary_indep_var(&self) -> T;

    /// Upper bound of the primary independent variable.
    fn upper_bound_of_primary_indep_var(&self) -> T;

    /// Checks whether both distributions have the same primary bounds.
    fn has_same_primary_bounds(&self, other: &dyn BivariateDistribution<T>) -> bool {
        self.lower_bound_of_primary_indep_var() == other.lower_bound_of_primary_indep_var()
            && self.upper_bound_of_primary_indep_var() == other.upper_bound_of_primary_indep_var()
    }
}

/// Bivariate distribution which can be evaluated.
///
/// Evaluation never fails: beyond the primary grid, and unless the grid
/// limits have been extended, all evaluations return zero.
pub trait BasicBivariateDistribution<T: Float>: BivariateDistribution<T> {
    /// Evaluates the distribution.
    fn evaluate(&self, primary: T, secondary: T) -> T;

    /// Evaluates the secondary conditional PDF.
    fn evaluate_secondary_conditional_pdf(&self, primary: T, secondary: T) -> T;

    /// Lower bound of the secondary conditional independent variable.
    fn lower_bound_of_secondary_conditional_indep_var(&self, primary: T) -> T;

    /// Upper bound of the secondary conditional independent variable.
    fn upper_bound_of_secondary_conditional_indep_var(&self, primary: T) -> T;

    /// Archive record of the distribution.
    fn to_record(&self) -> BivariateRecord;
}

/// Bivariate distribution with tabular secondary conditional distributions
/// supporting CDF evaluation and sampling.
///
/// Sampling fails beyond the primary grid unless the grid limits have been
/// extended.
pub trait FullyTabularBasicBivariateDistribution<T: Float>: BasicBivariateDistribution<T> {
    /// Evaluates the secondary conditional CDF.
    fn evaluate_secondary_conditional_cdf(&self, primary: T, secondary: T) -> T;

    /// Samples from the secondary conditional distribution.
    fn sample_secondary_conditional(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
    ) -> Result<T, SamplingError>;

    /// Samples from the secondary conditional distribution and increments the
    /// trial counter, including when sampling fails.
    fn sample_secondary_conditional_and_record_trials(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        trials: &mut u64,
    ) -> Result<T, SamplingError> {
        *trials += 1;

        self.sample_secondary_conditional(primary, rng)
    }

    /// Samples from the secondary conditional distribution and records the
    /// indices of the sampled primary grid point and secondary bin.
    fn sample_secondary_conditional_and_record_bin_indices(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        primary_bin_index: &mut usize,
        secondary_bin_index: &mut usize,
    ) -> Result<T, SamplingError> {
        let mut raw_sample = T::ZERO;

        self.sample_secondary_conditional_and_record_bin_indices_raw(
            primary,
            rng,
            primary_bin_index,
            secondary_bin_index,
            &mut raw_sample,
        )
    }

    /// Samples from the secondary conditional distribution and records the
    /// indices of the sampled primary grid point and secondary bin as well as
    /// the raw sample drawn from the secondary distribution of that grid
    /// point.
    fn sample_secondary_conditional_and_record_bin_indices_raw(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        primary_bin_index: &mut usize,
        secondary_bin_index: &mut usize,
        raw_sample: &mut T,
    ) -> Result<T, SamplingError>;

    /// Samples from the secondary conditional distribution with the specified
    /// uniform random number.
    ///
    /// The generator is only used by grid policies with a random choice of
    /// the primary grid point.
    fn sample_secondary_conditional_with_random_number(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        random_number: T,
    ) -> Result<T, SamplingError>;

    /// Samples from the secondary conditional distribution restricted to
    /// secondary values no greater than `max`.
    fn sample_secondary_conditional_in_subrange(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        max: T,
    ) -> Result<T, SamplingError> {
        let random_number = crate::random::random_number(rng);

        self.sample_secondary_conditional_with_random_number_in_subrange(
            primary,
            rng,
            random_number,
            max,
        )
    }

    /// Samples from the secondary conditional distribution restricted to
    /// secondary values no greater than `max`, with the specified uniform
    /// random number.
    fn sample_secondary_conditional_with_random_number_in_subrange(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        random_number: T,
        max: T,
    ) -> Result<T, SamplingError>;

    /// Extends the distribution beyond the primary grid limits using the
    /// secondary distributions at the grid limits.
    fn extend_beyond_primary_indep_limits(&mut self);

    /// Limits the distribution to the primary grid.
    fn limit_to_primary_indep_limits(&mut self);

    /// Checks whether the primary grid limits have been extended.
    fn are_primary_limits_extended(&self) -> bool;
}

/// Primary grid with a secondary distribution at each grid point.
///
/// Secondary distributions are shared: the same distribution may be used at
/// several grid points.
#[derive(Clone)]
pub struct BinnedData<T: Float> {
    primary_grid: Vec<T>,
    secondary_dists: Vec<Arc<dyn TabularUnivariateDistribution<T>>>,
    extended: bool,
}

impl<T: Float> BinnedData<T> {
    /// Creates the grid data, which must contain at least two grid points
    /// sorted in non-decreasing order.
    pub fn new(
        primary_grid: Vec<T>,
        secondary_dists: Vec<Arc<dyn TabularUnivariateDistribution<T>>>,
    ) -> Result<Self, ConstructionError> {
        if primary_grid.len() < 2 {
            return Err(ConstructionError::TooFewGridPoints {
                found: primary_grid.len(),
            });
        }
        if secondary_dists.len() != primary_grid.len() {
            return Err(ConstructionError::LengthMismatch {
                what: "secondary distributions",
                expected: primary_grid.len(),
                found: secondary_dists.len(),
            });
        }
        if let Some(index) = primary_grid.windows(2).position(|w| !(w[0] <= w[1])) {
            return Err(ConstructionError::UnsortedPrimaryGrid { index: index + 1 });
        }

        Ok(Self {
            primary_grid,
            secondary_dists,
            extended: false,
        })
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.primary_grid.len()
    }

    /// Always false: the grid has at least two points.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Primary grid.
    pub fn primary_grid(&self) -> &[T] {
        &self.primary_grid
    }

    /// Secondary distribution at a grid point.
    pub fn secondary(&self, index: usize) -> &dyn TabularUnivariateDistribution<T> {
        &*self.secondary_dists[index]
    }

    /// Shared secondary distribution at a grid point.
    pub fn shared_secondary(&self, index: usize) -> &Arc<dyn TabularUnivariateDistribution<T>> {
        &self.secondary_dists[index]
    }

    /// Grid point and secondary distribution at an index.
    pub fn bin(&self, index: usize) -> Bin<'_, T> {
        Bin {
            primary: self.primary_grid[index],
            secondary: self.secondary(index),
        }
    }

    /// Lower bound of the primary grid.
    pub fn lower_bound(&self) -> T {
        self.primary_grid[0]
    }

    /// Upper bound of the primary grid.
    pub fn upper_bound(&self) -> T {
        self.primary_grid[self.primary_grid.len() - 1]
    }

    /// Checks whether a primary value lies within the grid bounds.
    pub fn is_within_grid(&self, primary: T) -> bool {
        primary >= self.lower_bound() && primary <= self.upper_bound()
    }

    /// Checks whether a primary value can be handled, either because it lies
    /// within the grid bounds or because the grid limits are extended.
    pub fn is_accessible(&self, primary: T) -> bool {
        !primary.is_nan() && (self.extended || self.is_within_grid(primary))
    }

    /// Checks whether the grid limits are extended.
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// Sets the extension of the grid limits.
    pub fn set_extended(&mut self, extended: bool) {
        log::trace!("primary grid limits extended: {}", extended);
        self.extended = extended;
    }

    /// Finds the indices of the grid points bracketing a primary value.
    ///
    /// Beyond the grid, both indices are those of the nearest grid limit. A
    /// primary value on an interior grid point belongs to the bin starting at
    /// that point, except for the upper grid bound which belongs to the last
    /// bin. Returns `None` if the primary value is not accessible.
    pub fn find_bin_boundaries(&self, primary: T) -> Option<(usize, usize)> {
        if !self.is_accessible(primary) {
            return None;
        }

        let last = self.primary_grid.len() - 1;
        if primary < self.primary_grid[0] {
            Some((0, 0))
        } else if primary > self.primary_grid[last] {
            Some((last, last))
        } else {
            let index = find_lower_bin_index(&self.primary_grid, primary).ok()?;
            Some((index, index + 1))
        }
    }

    /// Finds the indices of the grid points bracketing a primary value for
    /// sampling.
    ///
    /// A primary value on an interior grid point belongs to the bin ending at
    /// that point, so that the sampled grid point is the upper boundary of
    /// the bin.
    pub fn find_sampling_bin_boundaries(&self, primary: T) -> Result<(usize, usize), SamplingError> {
        self.check_sampling_domain(primary)?;

        let last = self.primary_grid.len() - 1;
        if primary < self.primary_grid[0] {
            Ok((0, 0))
        } else if primary > self.primary_grid[last] {
            Ok((last, last))
        } else {
            find_lower_bin_index_including_upper_bound(&self.primary_grid, primary)
                .map(|index| (index, index + 1))
                .map_err(|_| self.outside_grid(primary))
        }
    }

    /// Checks that a primary value can be sampled.
    pub fn check_sampling_domain(&self, primary: T) -> Result<(), SamplingError> {
        if self.is_accessible(primary) {
            Ok(())
        } else {
            Err(self.outside_grid(primary))
        }
    }

    fn outside_grid(&self, primary: T) -> SamplingError {
        SamplingError::OutsidePrimaryGrid {
            value: primary.as_f64(),
            lower: self.lower_bound().as_f64(),
            upper: self.upper_bound().as_f64(),
        }
    }

    /// Checks that every secondary distribution satisfies a predicate.
    pub fn check_secondaries<F>(&self, is_compatible: F, policy: &'static str) -> Result<(), ConstructionError>
    where
        F: Fn(&dyn TabularUnivariateDistribution<T>) -> bool,
    {
        match self.secondary_dists.iter().position(|d| !is_compatible(&**d)) {
            Some(index) => Err(ConstructionError::IncompatibleSecondary { index, policy }),
            None => Ok(()),
        }
    }

    /// Archive records of the grid and of the secondary distributions.
    ///
    /// Secondary distributions shared between several grid points are only
    /// recorded once; the returned indices map each grid point to its record.
    pub fn to_records(&self) -> (Vec<f64>, Vec<TabularRecord>, Vec<usize>) {
        let mut unique: Vec<&Arc<dyn TabularUnivariateDistribution<T>>> = Vec::new();
        let mut indices = Vec::with_capacity(self.secondary_dists.len());

        for dist in &self.secondary_dists {
            let index = match unique.iter().position(|&u| Arc::ptr_eq(u, dist)) {
                Some(index) => index,
                None => {
                    unique.push(dist);
                    unique.len() - 1
                }
            };
            indices.push(index);
        }

        (
            self.primary_grid.iter().map(|x| x.as_f64()).collect(),
            unique.iter().map(|d| d.to_record()).collect(),
            indices,
        )
    }

    /// Rebuilds the grid data from archive records.
    ///
    /// Grid points mapped to the same record share the same distribution.
    pub fn from_records(
        primary_grid: &[f64],
        secondaries: &[TabularRecord],
        secondary_indices: &[usize],
        extended: bool,
    ) -> Result<Self, ArchiveError> {
        let unique = secondaries
            .iter()
            .map(|record| record.to_distribution::<T>())
            .collect::<Result<Vec<_>, _>>()?;

        let secondary_dists = secondary_indices
            .iter()
            .map(|&index| {
                unique
                    .get(index)
                    .cloned()
                    .ok_or(ArchiveError::BadSecondaryIndex { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut data = Self::new(
            primary_grid.iter().map(|&x| T::cast_f64(x)).collect(),
            secondary_dists,
        )?;
        data.extended = extended;

        Ok(data)
    }
}

impl<T: Float> Debug for BinnedData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinnedData")
            .field("primary_grid", &self.primary_grid)
            .field("secondary_dists", &self.secondary_dists)
            .field("extended", &self.extended)
            .finish()
    }
}
