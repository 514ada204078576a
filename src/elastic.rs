//! Elastic scattering angle distribution.

use crate::archive::{BivariateRecord, FromRecord, ELASTIC_KIND};
use crate::bivariate::*;
use crate::error::{ArchiveError, ConstructionError, SamplingError};
use crate::grid::{Evaluation, GridPolicy};
use crate::interpolation::{OneDInterpolation, Processing, TwoDInterpolation};
use crate::num::Float;
use crate::univariate::{TabularUnivariateDistribution, UnivariateDistribution};
use rand_core::RngCore;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Bivariate distribution of the scattering angle cosine of elastic
/// scattering as a function of the incoming energy.
///
/// The secondary variable is a cosine whose conditional distribution is
/// bounded by `[-1, cutoff]` at all energies. The secondary distributions are
/// combined with the cosine variant of the grid policy `G`.
pub struct ElasticBasicBivariateDistribution<G, T: Float> {
    data: BinnedData<T>,
    cutoff: T,
    tol: Tolerances,
    phantom_grid: PhantomData<fn() -> G>,
}

impl<G: GridPolicy, T: Float> ElasticBasicBivariateDistribution<G, T> {
    /// Creates the distribution with the specified cutoff cosine.
    pub fn new(
        primary_grid: Vec<T>,
        secondary_dists: Vec<Arc<dyn TabularUnivariateDistribution<T>>>,
        cutoff: T,
        tol: Tolerances,
    ) -> Result<Self, ConstructionError> {
        Self::from_data(BinnedData::new(primary_grid, secondary_dists)?, cutoff, tol)
    }

    fn from_data(data: BinnedData<T>, cutoff: T, tol: Tolerances) -> Result<Self, ConstructionError> {
        if !(cutoff > -T::ONE && cutoff <= T::ONE) {
            return Err(ConstructionError::BadCutoff);
        }

        let policy = <G::Interp as TwoDInterpolation>::NAME;
        match <<G::Interp as TwoDInterpolation>::ZY as OneDInterpolation>::INDEP {
            Processing::Lin | Processing::LogCos | Processing::NudgedLogCos => {}
            Processing::Log => return Err(ConstructionError::UnsupportedSecondaryProcessing { policy }),
        }
        data.check_secondaries(|d| G::is_compatible_secondary(d), policy)?;
        log::debug!(
            "{}<{}> elastic distribution built over {} primary grid points with cutoff {}",
            G::NAME,
            policy,
            data.len(),
            cutoff
        );

        Ok(Self {
            data,
            cutoff,
            tol,
            phantom_grid: PhantomData,
        })
    }

    /// Cutoff cosine.
    pub fn cutoff(&self) -> T {
        self.cutoff
    }

    /// Tolerances of the interpolation.
    pub fn tolerances(&self) -> &Tolerances {
        &self.tol
    }

    fn limits(&self) -> (T, T) {
        (-T::ONE, self.cutoff)
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
        let limits = self.limits();
        match method {
            Evaluation::Cdf => G::evaluate_cdf_cos(primary, secondary, limits, &lower, &upper, &self.tol),
            _ => G::evaluate_pdf_cos(primary, secondary, limits, &lower, &upper, method, &self.tol),
        }
    }

    // Samples with the secondary random number drawn before the choice of the
    // primary grid point.
    fn sample_impl(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        random_number: Option<T>,
        secondary_bin_index: &mut usize,
    ) -> Result<(T, T, usize), SamplingError> {
        self.data.check_sampling_domain(primary)?;

        let r = random_number.unwrap_or_else(|| crate::random::random_number(rng));
        let mut sample = |d: &dyn TabularUnivariateDistribution<T>, r: T| {
            d.sample_with_random_number_and_record_bin_index(r, secondary_bin_index)
        };

        let (i, j) = self.data.find_sampling_bin_boundaries(primary)?;
        if i == j {
            let value = sample(self.data.secondary(i), r);

            return Ok((value, value, i));
        }

        let (lower, upper) = (self.data.bin(i), self.data.bin(j));
        let s = G::sample_cos_detailed(primary, &lower, &upper, rng, Some(r), &mut sample, &self.tol);

        Ok((s.value, s.raw, s.side.select(i, j)))
    }
}

impl<G: GridPolicy, T: Float> Clone for ElasticBasicBivariateDistribution<G, T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            cutoff: self.cutoff,
            tol: self.tol,
            phantom_grid: PhantomData,
        }
    }
}

impl<G: GridPolicy, T: Float> fmt::Debug for ElasticBasicBivariateDistribution<G, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticBasicBivariateDistribution")
            .field("grid", &G::NAME)
            .field("interp", &<G::Interp as TwoDInterpolation>::NAME)
            .field("data", &self.data)
            .field("cutoff", &self.cutoff)
            .field("tol", &self.tol)
            .finish()
    }
}

impl<G: GridPolicy, T: Float> fmt::Display for ElasticBasicBivariateDistribution<G, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}<{}> elastic distribution with cutoff {} and {} primary grid points in [{}, {}]",
            G::NAME,
            <G::Interp as TwoDInterpolation>::NAME,
            self.cutoff,
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

impl<G: GridPolicy, T: Float> BivariateDistribution<T> for ElasticBasicBivariateDistribution<G, T> {
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

impl<G: GridPolicy, T: Float> BasicBivariateDistribution<T> for ElasticBasicBivariateDistribution<G, T> {
    fn evaluate(&self, primary: T, secondary: T) -> T {
        self.evaluate_impl(primary, secondary, Evaluation::Value)
    }

    fn evaluate_secondary_conditional_pdf(&self, primary: T, secondary: T) -> T {
        self.evaluate_impl(primary, secondary, Evaluation::Pdf)
    }

    fn lower_bound_of_secondary_conditional_indep_var(&self, primary: T) -> T {
        if self.data.is_accessible(primary) {
            -T::ONE
        } else {
            T::ZERO
        }
    }

    fn upper_bound_of_secondary_conditional_indep_var(&self, primary: T) -> T {
        if self.data.is_accessible(primary) {
            self.cutoff
        } else {
            T::ZERO
        }
    }

    fn to_record(&self) -> BivariateRecord {
        let (primary_grid, secondaries, secondary_indices) = self.data.to_records();

        BivariateRecord {
            kind: ELASTIC_KIND.to_string(),
            grid: G::NAME.to_string(),
            interp: <G::Interp as TwoDInterpolation>::NAME.to_string(),
            tolerances: self.tol,
            primary_grid,
            secondaries,
            secondary_indices,
            extended: self.data.is_extended(),
            cutoff: Some(self.cutoff.as_f64()),
        }
    }
}

impl<G: GridPolicy, T: Float> FullyTabularBasicBivariateDistribution<T>
    for ElasticBasicBivariateDistribution<G, T>
{
    fn evaluate_secondary_conditional_cdf(&self, primary: T, secondary: T) -> T {
        self.evaluate_impl(primary, secondary, Evaluation::Cdf)
    }

    fn sample_secondary_conditional(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
    ) -> Result<T, SamplingError> {
        let mut index = 0;

        Ok(self.sample_impl(primary, rng, None, &mut index)?.0)
    }

    fn sample_secondary_conditional_and_record_bin_indices_raw(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        primary_bin_index: &mut usize,
        secondary_bin_index: &mut usize,
        raw_sample: &mut T,
    ) -> Result<T, SamplingError> {
        let (value, raw, index) = self.sample_impl(primary, rng, None, secondary_bin_index)?;
        *primary_bin_index = index;
        *raw_sample = raw;

        Ok(value)
    }

    fn sample_secondary_conditional_with_random_number(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        random_number: T,
    ) -> Result<T, SamplingError> {
        let mut index = 0;

        Ok(self.sample_impl(primary, rng, Some(random_number), &mut index)?.0)
    }

    fn sample_secondary_conditional_with_random_number_in_subrange(
        &self,
        primary: T,
        rng: &mut dyn RngCore,
        random_number: T,
        max: T,
    ) -> Result<T, SamplingError> {
        self.data.check_sampling_domain(primary)?;

        let max = max.min(self.cutoff);
        let (i, j) = self.data.find_sampling_bin_boundaries(primary)?;
        if i == j {
            let dist = self.data.secondary(i);
            return Ok(dist.sample_with_random_number_in_subrange(random_number, max.min(dist.upper_bound())));
        }

        let (lower, upper) = (self.data.bin(i), self.data.bin(j));

        Ok(G::sample_cos_in_subrange(
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

impl<G: GridPolicy> FromRecord for ElasticBasicBivariateDistribution<G, f64> {
    fn from_record(record: &BivariateRecord) -> Result<Self, ArchiveError> {
        record.check_type(ELASTIC_KIND, G::NAME, <G::Interp as TwoDInterpolation>::NAME)?;

        let cutoff = record.cutoff.ok_or(ConstructionError::BadCutoff)?;
        let data = BinnedData::from_records(
            &record.primary_grid,
            &record.secondaries,
            &record.secondary_indices,
            record.extended,
        )?;
        log::debug!("loading {} record with {} secondaries", record.kind, record.secondaries.len());

        Ok(Self::from_data(data, cutoff, record.tolerances)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Correlated, UnitBase};
    use crate::interpolation::{LinLinLin, LinLinLog, LogLogCosLog, LogLogLog};
    use crate::random::FakeStream;
    use crate::univariate::{TabularDistribution, UniformDistribution};
    use approx::assert_relative_eq;

    fn uniform(lower: f64, upper: f64, value: f64) -> Arc<dyn TabularUnivariateDistribution<f64>> {
        Arc::new(UniformDistribution::new(lower, upper, value).unwrap())
    }

    fn secondaries() -> Vec<Arc<dyn TabularUnivariateDistribution<f64>>> {
        let d0: Arc<dyn TabularUnivariateDistribution<f64>> =
            Arc::new(TabularDistribution::new(vec![-1.0, 0.0, 0.999999], vec![0.1, 0.5, 1.0]).unwrap());
        let d1: Arc<dyn TabularUnivariateDistribution<f64>> =
            Arc::new(TabularDistribution::new(vec![-1.0, 0.0, 0.999999], vec![1.0, 5.0, 10.0]).unwrap());

        vec![d0, d1]
    }

    #[test]
    fn evaluate() {
        let tol = Tolerances::default();
        let unit_base = ElasticBasicBivariateDistribution::<UnitBase<LogLogCosLog>, f64>::new(
            vec![1.0, 2.0],
            secondaries(),
            0.999999,
            tol,
        )
        .unwrap();
        let correlated = ElasticBasicBivariateDistribution::<Correlated<LogLogCosLog>, f64>::new(
            vec![1.0, 2.0],
            secondaries(),
            0.999999,
            tol,
        )
        .unwrap();

        assert_relative_eq!(
            unit_base.evaluate(1.5, -1.0),
            3.84558575793691015399e-01,
            max_relative = 1e-14
        );
        assert_relative_eq!(
            correlated.evaluate(1.5, -1.0),
            2.1117818980603434e-01,
            max_relative = 1e-14
        );

        assert_eq!(unit_base.lower_bound_of_secondary_conditional_indep_var(1.5), -1.0);
        assert_eq!(unit_base.upper_bound_of_secondary_conditional_indep_var(1.5), 0.999999);
        assert_eq!(unit_base.upper_bound_of_secondary_conditional_indep_var(3.0), 0.0);
        assert_eq!(unit_base.evaluate(3.0, -1.0), 0.0);
    }

    #[test]
    fn sample_draws_cosine_first() {
        let dist = ElasticBasicBivariateDistribution::<UnitBase<LinLinLin>, f64>::new(
            vec![0.0, 1.0],
            vec![uniform(-1.0, 1.0, 0.5), uniform(-1.0, 0.5, 1.0 / 1.5)],
            1.0,
            Tolerances::default(),
        )
        .unwrap();

        // The first number is the cosine random number, the second one selects
        // the upper grid point.
        let mut rng = FakeStream::new(vec![0.5, 0.25]);
        let mut primary_index = 0;
        let mut secondary_index = 0;
        let mut raw = 0.0;
        dist.sample_secondary_conditional_and_record_bin_indices_raw(
            0.5,
            &mut rng,
            &mut primary_index,
            &mut secondary_index,
            &mut raw,
        )
        .unwrap();
        assert_eq!(primary_index, 1);
        assert_eq!(raw, -0.25);
        assert_eq!(rng.position(), 0);

        assert!(dist.sample_secondary_conditional(1.5, &mut rng).is_err());
    }

    #[test]
    fn subrange_clamped_to_cutoff() {
        let dist = ElasticBasicBivariateDistribution::<UnitBase<LinLinLin>, f64>::new(
            vec![0.0, 1.0],
            vec![uniform(-1.0, 0.5, 1.0 / 1.5), uniform(-1.0, 0.5, 1.0 / 1.5)],
            0.5,
            Tolerances::default(),
        )
        .unwrap();

        let mut rng = FakeStream::new(vec![0.5]);
        let y = dist
            .sample_secondary_conditional_with_random_number_in_subrange(0.0, &mut rng, 0.5, 1.0)
            .unwrap();
        assert_eq!(y, -0.25);
    }

    #[test]
    fn invalid() {
        let tol = Tolerances::default();

        assert_eq!(
            ElasticBasicBivariateDistribution::<UnitBase<LinLinLog>, f64>::new(
                vec![1.0, 2.0],
                secondaries(),
                -1.0,
                tol
            )
            .err(),
            Some(ConstructionError::BadCutoff)
        );
        assert_eq!(
            ElasticBasicBivariateDistribution::<UnitBase<LogLogLog>, f64>::new(
                vec![1.0, 2.0],
                secondaries(),
                0.999999,
                tol
            )
            .err(),
            Some(ConstructionError::UnsupportedSecondaryProcessing { policy: "LogLogLog" })
        );
    }
}
