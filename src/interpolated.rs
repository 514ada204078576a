//! Interpolated fully tabular bivariate distribution.

use crate::archive::{BivariateRecord, FromRecord, INTERPOLATED_KIND};
use crate::bivariate::*;
use crate::error::{ArchiveError, ConstructionError, SamplingError};
use crate::grid::{BinSide, Evaluation, GridPolicy, Sample, SampleFn};
use crate::interpolation::{OneDInterpolation, TwoDInterpolation};
use crate::num::Float;
use crate::random::random_number;
use crate::univariate::{TabularDistribution, TabularUnivariateDistribution, UnivariateDistribution};
use rand_core::RngCore;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Bivariate distribution interpolating between tabular secondary
/// distributions with a grid policy `G`.
///
/// The secondary conditional distribution at a primary value is obtained by
/// combining the secondary distributions of the two bracketing primary grid
/// points according to `G`. Beyond the primary grid, the distribution is
/// zero unless the grid limits are extended, in which case the secondary
/// distribution of the nearest grid limit is used.
pub struct InterpolatedFullyTabularBasicBivariateDistribution<G, T: Float> {
    data: BinnedData<T>,
    tol: Tolerances,
    phantom_grid: PhantomData<fn() -> G>,
}

impl<G: GridPolicy, T: Float> InterpolatedFullyTabularBasicBivariateDistribution<G, T> {
    /// Creates the distribution with default tolerances.
    pub fn new(
        primary_grid: Vec<T>,
        secondary_dists: Vec<Arc<dyn TabularUnivariateDistribution<T>>>,
    ) -> Result<Self, ConstructionError> {
        Self::with_tolerances(primary_grid, secondary_dists, Tolerances::default())
    }

    /// Creates the distribution with the specified tolerances.
    pub fn with_tolerances(
        primary_grid: Vec<T>,
        secondary_dists: Vec<Arc<dyn TabularUnivariateDistribution<T>>>,
        tol: Tolerances,
    ) -> Result<Self, ConstructionError> {
        Self::from_data(BinnedData::new(primary_grid, secondary_dists)?, tol)
    }

    /// Creates the distribution from tabulated secondary grids and values,
    /// with one lin-lin tabular secondary distribution per primary grid point.
    pub fn from_grids(
        primary_grid: Vec<T>,
        secondary_grids: Vec<Vec<T>>,
        values: Vec<Vec<T>>,
        tol: Tolerances,
    ) -> Result<Self, ConstructionError> {
        if secondary_grids.len() != primary_grid.len() {
            return Err(ConstructionError::LengthMismatch {
                what: "secondary grids",
                expected: primary_grid.len(),
                found: secondary_grids.len(),
            });
        }
        if values.len() != primary_grid.len() {
            return Err(ConstructionError::LengthMismatch {
                what: "secondary value sets",
                expected: primary_grid.len(),
                found: values.len(),
            });
        }

        let secondary_dists = secondary_grids
            .into_iter()
            .zip(values)
            .map(|(grid, values)| {
                let dist: Arc<dyn TabularUnivariateDistribution<T>> =
                    Arc::new(TabularDistribution::new(grid, values)?);
                Ok(dist)
            })
            .collect::<Result<Vec<_>, ConstructionError>>()?;

        Self::with_tolerances(primary_grid, secondary_dists, tol)
    }

    fn from_data(data: BinnedData<T>, tol: Tolerances) -> Result<Self, ConstructionError> {
        data.check_secondaries(|d| G::is_compatible_secondary(d), <G::Interp as TwoDInterpolation>::NAME)?;
        log::debug!(
            "{}<{}> interpolated distribution built over {} primary grid points",
            G::NAME,
            <G::Interp as TwoDInterpolation>::NAME,
            data.len()
        );

        Ok(Self {
            data,
            tol,
            phantom_grid: PhantomData,
        })
    }

    /// Tolerances of the interpolation.
    pub fn tolerances(&self) -> &Tolerances {
        &self.tol
    }

    /// Primary grid and secondary distributions.
    pub fn data(&self) -> &BinnedData<T> {
        &self.data
    }

    fn evaluate_impl(&self, primary: T, secondary: T, method: Evaluation) -> T {
        let (i, j) = match self.data.find_bin_boundaries(primary) {
            Some(bounds) => bounds,
            None => return T::ZERO,
        };
        if i == j {
            return method.apply(self.data.secondary(i), secondary);
        }

        let (lower, upper) = (self.data.bin(i), self.data.bin(j));
        match method {
            Evaluation::Cdf => G::evaluate_cdf(primary, secondary, &lower, &upper, &self.tol),
            _ => G::evaluate_pdf(primary, secondary, &lower, &upper, method, &self.tol),
        }
    }

    // Samples the secondary conditional distribution and returns the detailed
    // sample with the index of the sampled primary grid point.
    fn sample_impl(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        random_number: Option<T>,
        sample: &mut SampleFn<'_, T>,
    ) -> Result<(Sample<T>, usize), SamplingError> {
        self.data.check_sampling_domain(primary)?;

        let (i, j) = self.data.find_sampling_bin_boundaries(primary)?;
        if i == j {
            let r = random_number.unwrap_or_else(|| crate::random::random_number(rng));
            let value = sample(self.data.secondary(i), r);

            return Ok((Sample::unscaled(value, BinSide::Lower), i));
        }

        let (lower, upper) = (self.data.bin(i), self.data.bin(j));
        let s = G::sample_detailed(primary, &lower, &upper, rng, random_number, sample, &self.tol);

        Ok((s, s.side.select(i, j)))
    }

    /// Samples from the secondary conditional distribution without a random
    /// choice of the primary grid point.
    ///
    /// The secondary distributions of both bracketing grid points are sampled
    /// with the same random number and the samples are interpolated.
    pub fn sample_secondary_conditional_exact(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
    ) -> Result<T, SamplingError> {
        self.data.check_sampling_domain(primary)?;

        self.sample_secondary_conditional_exact_with_random_number(primary, random_number(rng))
    }

    /// Samples from the secondary conditional distribution without a random
    /// choice of the primary grid point, with the specified random number.
    pub fn sample_secondary_conditional_exact_with_random_number(
        &self,
        primary: T,
        random_number: T,
    ) -> Result<T, SamplingError> {
        self.sample_exact_impl(primary, |d| d.sample_with_random_number(random_number))
    }

    /// Samples from the secondary conditional distribution without a random
    /// choice of the primary grid point, restricted to secondary values no
    /// greater than `max`.
    pub fn sample_secondary_conditional_exact_in_subrange(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        max: T,
    ) -> Result<T, SamplingError> {
        self.data.check_sampling_domain(primary)?;

        self.sample_secondary_conditional_exact_with_random_number_in_subrange(
            primary,
            random_number(rng),
            max,
        )
    }

    /// Samples from the secondary conditional distribution without a random
    /// choice of the primary grid point, with the specified random number and
    /// restricted to secondary values no greater than `max`.
    pub fn sample_secondary_conditional_exact_with_random_number_in_subrange(
        &self,
        primary: T,
        random_number: T,
        max: T,
    ) -> Result<T, SamplingError> {
        type ZY<G> = <<G as GridPolicy>::Interp as TwoDInterpolation>::ZY;

        self.data.check_sampling_domain(primary)?;
        let (i, j) = self.data.find_sampling_bin_boundaries(primary)?;
        if i == j || primary == self.data.bin(i).primary || primary == self.data.bin(j).primary {
            return self.sample_exact_impl(primary, |d| {
                d.sample_with_random_number_in_subrange(random_number, max.min(d.upper_bound()))
            });
        }

        let (lower, upper) = (self.data.bin(i), self.data.bin(j));
        let (x0, x1) = (lower.primary, upper.primary);
        let y_min = <G::Interp as TwoDInterpolation>::calculate_intermediate_grid_limit(
            x0,
            x1,
            primary,
            lower.lower_bound(),
            upper.lower_bound(),
        );
        let l0 = ZY::<G>::calculate_unit_base_grid_length(lower.lower_bound(), lower.upper_bound());
        let l1 = ZY::<G>::calculate_unit_base_grid_length(upper.lower_bound(), upper.upper_bound());
        let l = <G::Interp as TwoDInterpolation>::calculate_intermediate_grid_length(x0, x1, primary, l0, l1);

        // Maximum mapped onto the grid of each bin.
        let fuzz = T::cast_f64(self.tol.fuzzy_boundary);
        let eta_max = ZY::<G>::calculate_unit_base_indep_var(max, y_min, l, fuzz);
        let max0 = ZY::<G>::calculate_indep_var(eta_max, lower.lower_bound(), l0, fuzz).min(lower.upper_bound());
        let max1 = ZY::<G>::calculate_indep_var(eta_max, upper.lower_bound(), l1, fuzz).min(upper.upper_bound());

        let y0 = lower.secondary.sample_with_random_number_in_subrange(random_number, max0);
        let y1 = upper.secondary.sample_with_random_number_in_subrange(random_number, max1);

        Ok(<G::Interp as TwoDInterpolation>::calculate_intermediate_grid_limit(
            x0, x1, primary, y0, y1,
        ))
    }

    fn sample_exact_impl<F>(&self, primary: T, sample: F) -> Result<T, SamplingError>
    where
        F: Fn(&dyn TabularUnivariateDistribution<T>) -> T,
    {
        self.data.check_sampling_domain(primary)?;

        let (i, j) = self.data.find_sampling_bin_boundaries(primary)?;
        let (lower, upper) = (self.data.bin(i), self.data.bin(j));
        if i == j || primary == lower.primary {
            return Ok(sample(lower.secondary));
        }
        if primary == upper.primary {
            return Ok(sample(upper.secondary));
        }

        let y0 = sample(lower.secondary);
        let y1 = sample(upper.secondary);

        Ok(<G::Interp as TwoDInterpolation>::calculate_intermediate_grid_limit(
            lower.primary,
            upper.primary,
            primary,
            y0,
            y1,
        ))
    }
}

impl<G: GridPolicy, T: Float> Clone for InterpolatedFullyTabularBasicBivariateDistribution<G, T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            tol: self.tol,
            phantom_grid: PhantomData,
        }
    }
}

impl<G: GridPolicy, T: Float> fmt::Debug for InterpolatedFullyTabularBasicBivariateDistribution<G, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolatedFullyTabularBasicBivariateDistribution")
            .field("grid", &G::NAME)
            .field("interp", &<G::Interp as TwoDInterpolation>::NAME)
            .field("data", &self.data)
            .field("tol", &self.tol)
            .finish()
    }
}

impl<G: GridPolicy, T: Float> fmt::Display for InterpolatedFullyTabularBasicBivariateDistribution<G, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}<{}> interpolated distribution with {} primary grid points in [{}, {}]",
            G::NAME,
            <G::Interp as TwoDInterpolation>::NAME,
            self.data.len(),
            self.data.lower_bound(),
            self.data.upper_bound(),
        )?;
        if self.data.is_extended() {
            write!(f, " (extended)")?;
        }

        Ok(())
    }
}

impl<G: GridPolicy, T: Float> BivariateDistribution<T>
    for InterpolatedFullyTabularBasicBivariateDistribution<G, T>
{
    fn is_primary_dimension_tabular(&self) -> bool {
        true
    }

    fn is_primary_dimension_continuous(&self) -> bool {
        true
    }

    fn lower_bound_of_primary_indep_var(&self) -> T {
        self.data.lower_bound()
    }

    fn upper_bound_of_primary_indep_var(&self) -> T {
        self.data.upper_bound()
    }
}

impl<G: GridPolicy, T: Float> BasicBivariateDistribution<T>
    for InterpolatedFullyTabularBasicBivariateDistribution<G, T>
{
    fn evaluate(&self, primary: T, secondary: T) -> T {
        self.evaluate_impl(primary, secondary, Evaluation::Value)
    }

    fn evaluate_secondary_conditional_pdf(&self, primary: T, secondary: T) -> T {
        self.evaluate_impl(primary, secondary, Evaluation::Pdf)
    }

    fn lower_bound_of_secondary_conditional_indep_var(&self, primary: T) -> T {
        let (i, j) = match self.data.find_bin_boundaries(primary) {
            Some(bounds) => bounds,
            None => return T::ZERO,
        };
        if i == j {
            self.data.secondary(i).lower_bound()
        } else {
            G::calculate_lower_bound(primary, &self.data.bin(i), &self.data.bin(j))
        }
    }

    fn upper_bound_of_secondary_conditional_indep_var(&self, primary: T) -> T {
        let (i, j) = match self.data.find_bin_boundaries(primary) {
            Some(bounds) => bounds,
            None => return T::ZERO,
        };
        if i == j {
            self.data.secondary(i).upper_bound()
        } else {
            G::calculate_upper_bound(primary, &self.data.bin(i), &self.data.bin(j))
        }
    }

    fn to_record(&self) -> BivariateRecord {
        let (primary_grid, secondaries, secondary_indices) = self.data.to_records();

        BivariateRecord {
            kind: INTERPOLATED_KIND.to_string(),
            grid: G::NAME.to_string(),
            interp: <G::Interp as TwoDInterpolation>::NAME.to_string(),
            tolerances: self.tol,
            primary_grid,
            secondaries,
            secondary_indices,
            extended: self.data.is_extended(),
            cutoff: None,
        }
    }
}

impl<G: GridPolicy, T: Float> FullyTabularBasicBivariateDistribution<T>
    for InterpolatedFullyTabularBasicBivariateDistribution<G, T>
{
    fn evaluate_secondary_conditional_cdf(&self, primary: T, secondary: T) -> T {
        self.evaluate_impl(primary, secondary, Evaluation::Cdf)
    }

    fn sample_secondary_conditional(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
    ) -> Result<T, SamplingError> {
        let (s, _) = self.sample_impl(primary, rng, None, &mut |d, r| d.sample_with_random_number(r))?;

        Ok(s.value)
    }

    fn sample_secondary_conditional_and_record_bin_indices_raw(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        primary_bin_index: &mut usize,
        secondary_bin_index: &mut usize,
        raw_sample: &mut T,
    ) -> Result<T, SamplingError> {
        let mut index = 0;
        let (s, primary_index) = self.sample_impl(primary, rng, None, &mut |d, r| {
            d.sample_with_random_number_and_record_bin_index(r, &mut index)
        })?;

        *primary_bin_index = primary_index;
        *secondary_bin_index = index;
        *raw_sample = s.raw;

        Ok(s.value)
    }

    fn sample_secondary_conditional_with_random_number(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        random_number: T,
    ) -> Result<T, SamplingError> {
        let (s, _) = self.sample_impl(primary, rng, Some(random_number), &mut |d, r| {
            d.sample_with_random_number(r)
        })?;

        Ok(s.value)
    }

    fn sample_secondary_conditional_with_random_number_in_subrange(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        random_number: T,
        max: T,
    ) -> Result<T, SamplingError> {
        self.data.check_sampling_domain(primary)?;

        let (i, j) = self.data.find_sampling_bin_boundaries(primary)?;
        if i == j {
            let dist = self.data.secondary(i);
            return Ok(dist.sample_with_random_number_in_subrange(random_number, max.min(dist.upper_bound())));
        }

        let (lower, upper) = (self.data.bin(i), self.data.bin(j));
        let max = max.min(G::calculate_upper_bound(primary, &lower, &upper));

        Ok(G::sample_in_subrange(
            primary,
            &lower,
            &upper,
            rng,
            max,
            &mut |d, m| d.sample_with_random_number_in_subrange(random_number, m),
            &self.tol,
        ))
    }

    fn extend_beyond_primary_indep_limits(&mut self) {
        self.data.set_extended(true);
    }

    fn limit_to_primary_indep_limits(&mut self) {
        self.data.set_extended(false);
    }

    fn are_primary_limits_extended(&self) -> bool {
        self.data.is_extended()
    }
}

impl<G: GridPolicy> FromRecord for InterpolatedFullyTabularBasicBivariateDistribution<G, f64> {
    fn from_record(record: &BivariateRecord) -> Result<Self, ArchiveError> {
        record.check_type(INTERPOLATED_KIND, G::NAME, <G::Interp as TwoDInterpolation>::NAME)?;

        let data = BinnedData::from_records(
            &record.primary_grid,
            &record.secondaries,
            &record.secondary_indices,
            record.extended,
        )?;
        log::debug!("loading {} record with {} secondaries", record.kind, record.secondaries.len());

        Ok(Self::from_data(data, record.tolerances)?)
    }
}
