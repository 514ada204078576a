use super::{correlated_density, estimate_cdf, intermediate_limits, primary_fraction};
use super::{resolve_random_number, BinSide};
use super::{Bin, Evaluation, GridPolicy, Sample, SampleFn, SubrangeSampleFn};
use crate::bivariate::Tolerances;
use crate::interpolation::{fuzzy_lower_bound, fuzzy_upper_bound, OneDInterpolation, TwoDInterpolation};
use crate::num::Float;
use crate::univariate::UnivariateDistribution;
use rand_core::RngCore;
use std::marker::PhantomData;

/// Correlated grid policy.
///
/// The secondary distributions of both bins are combined at equal values of
/// their CDF: a sample is interpolated between the samples of both bins drawn
/// with the same random number. Evaluation requires an iterative estimate of
/// the common CDF value of a secondary value.
///
/// When sampling, the upper bin is sampled before the lower bin. The raw
/// sample and the recorded secondary bin are therefore those of the lower
/// bin, and the raw sample is the unscaled lower bin sample rather than the
/// interpolated value.
#[derive(Copy, Clone, Debug, Default)]
pub struct Correlated<I> {
    phantom_interp: PhantomData<I>,
}

impl<I: TwoDInterpolation> Correlated<I> {
    // Secondary value at the common CDF value `c`.
    fn secondary_at_cdf<T: Float>(beta: T, lower: &Bin<T>, upper: &Bin<T>, c: T) -> T {
        I::YX::interpolate_beta(
            beta,
            lower.secondary.sample_with_random_number(c),
            upper.secondary.sample_with_random_number(c),
        )
    }

    // Common CDF value of the secondary value `y`.
    fn cdf_at_secondary<T: Float>(
        beta: T,
        y: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        tol: &Tolerances,
    ) -> T {
        let initial = (
            lower.secondary.evaluate_cdf(y),
            upper.secondary.evaluate_cdf(y),
        );

        estimate_cdf(
            y,
            initial,
            (0.9, 1.1),
            |c| Self::secondary_at_cdf(beta, lower, upper, c),
            tol,
        )
    }

    // Evaluates the combined distribution at a secondary value within
    // `[y_min, y_max]`, where `at_limits` gives the secondary values of both
    // bins at these limits.
    #[allow(clippy::too_many_arguments)]
    fn evaluate_within_limits<T: Float>(
        x: T,
        y: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        (y_min, y_max): (T, T),
        at_limits: ((T, T), (T, T)),
        method: Evaluation,
        tol: &Tolerances,
    ) -> T {
        let beta = primary_fraction::<I, T>(x, lower, upper);

        let (y0, y1) = if y <= y_min {
            at_limits.0
        } else if y >= y_max {
            at_limits.1
        } else {
            let c = Self::cdf_at_secondary(beta, y, lower, upper, tol);
            (
                lower.secondary.sample_with_random_number(c),
                upper.secondary.sample_with_random_number(c),
            )
        };

        let f0 = method.apply(lower.secondary, y0);
        let f1 = method.apply(upper.secondary, y1);
        if f0 == f1 {
            return f0;
        }

        let processing = I::YX::DEP;
        correlated_density(
            beta,
            processing.inverse_derivative(y0) * f0,
            processing.inverse_derivative(y1) * f1,
            processing.inverse_derivative(y),
        )
    }

    fn evaluate_cdf_within_limits<T: Float>(
        x: T,
        y: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        (y_min, y_max): (T, T),
        tol: &Tolerances,
    ) -> T {
        if y <= y_min {
            return T::ZERO;
        }
        if y >= y_max {
            return T::ONE;
        }
        let beta = primary_fraction::<I, T>(x, lower, upper);

        Self::cdf_at_secondary(beta, y, lower, upper, tol)
    }

    // Interpolates two samples drawn at the same CDF value.
    fn combine<T: Float>(x: T, lower: &Bin<T>, upper: &Bin<T>, y0: T, y1: T) -> T {
        if y0 == y1 {
            y0
        } else {
            I::YX::interpolate_beta(primary_fraction::<I, T>(x, lower, upper), y0, y1)
        }
    }
}

impl<I: TwoDInterpolation> GridPolicy for Correlated<I> {
    const NAME: &'static str = "Correlated";

    type Interp = I;
    type CosGrid = Self;

    fn calculate_lower_bound<T: Float>(x: T, lower: &Bin<T>, upper: &Bin<T>) -> T {
        intermediate_limits::<I, T>(x, lower, upper).0
    }

    fn calculate_upper_bound<T: Float>(x: T, lower: &Bin<T>, upper: &Bin<T>) -> T {
        intermediate_limits::<I, T>(x, lower, upper).1
    }

    fn evaluate_pdf<T: Float>(
        x: T,
        y: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        method: Evaluation,
        tol: &Tolerances,
    ) -> T {
        if x == lower.primary {
            return method.apply(lower.secondary, y);
        }
        if x == upper.primary {
            return method.apply(upper.secondary, y);
        }

        let fuzz = T::cast_f64(tol.fuzzy_boundary);
        let limits = intermediate_limits::<I, T>(x, lower, upper);
        if y < fuzzy_lower_bound(limits.0, fuzz) || y > fuzzy_upper_bound(limits.1, fuzz) {
            return T::ZERO;
        }

        let at_limits = (
            (lower.lower_bound(), upper.lower_bound()),
            (lower.upper_bound(), upper.upper_bound()),
        );
        Self::evaluate_within_limits(x, y, lower, upper, limits, at_limits, method, tol)
    }

    fn evaluate_cdf<T: Float>(x: T, y: T, lower: &Bin<T>, upper: &Bin<T>, tol: &Tolerances) -> T {
        if x == lower.primary {
            return lower.secondary.evaluate_cdf(y);
        }
        if x == upper.primary {
            return upper.secondary.evaluate_cdf(y);
        }
        let limits = intermediate_limits::<I, T>(x, lower, upper);

        Self::evaluate_cdf_within_limits(x, y, lower, upper, limits, tol)
    }

    fn sample_detailed<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        rng: &mut dyn RngCore,
        random_number: Option<T>,
        sample: &mut SampleFn<'_, T>,
        _tol: &Tolerances,
    ) -> Sample<T> {
        let r = resolve_random_number(rng, random_number);
        if x == upper.primary {
            return Sample::unscaled(sample(upper.secondary, r), BinSide::Upper);
        }
        if x == lower.primary {
            return Sample::unscaled(sample(lower.secondary, r), BinSide::Lower);
        }

        // The lower bin is sampled last so that it is the one recorded.
        let y1 = sample(upper.secondary, r);
        let y0 = sample(lower.secondary, r);

        Sample {
            value: Self::combine(x, lower, upper, y0, y1),
            raw: y0,
            side: BinSide::Lower,
        }
    }

    fn sample_in_subrange<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        _rng: &mut dyn RngCore,
        max: T,
        sample: &mut SubrangeSampleFn<'_, T>,
        _tol: &Tolerances,
    ) -> T {
        if x == upper.primary {
            return sample(upper.secondary, max.min(upper.upper_bound()));
        }
        if x == lower.primary {
            return sample(lower.secondary, max.min(lower.upper_bound()));
        }

        let y1 = sample(upper.secondary, max.min(upper.upper_bound()));
        let y0 = sample(lower.secondary, max.min(lower.upper_bound()));

        Self::combine(x, lower, upper, y0, y1)
    }

    fn evaluate_pdf_cos<T: Float>(
        x: T,
        y: T,
        (y_min, y_max): (T, T),
        lower: &Bin<T>,
        upper: &Bin<T>,
        method: Evaluation,
        tol: &Tolerances,
    ) -> T {
        if x == lower.primary {
            return method.apply(lower.secondary, y);
        }
        if x == upper.primary {
            return method.apply(upper.secondary, y);
        }
        if y < y_min || y > y_max {
            return T::ZERO;
        }

        let at_limits = ((y_min, y_min), (y_max, y_max));
        Self::evaluate_within_limits(x, y, lower, upper, (y_min, y_max), at_limits, method, tol)
    }

    fn evaluate_cdf_cos<T: Float>(
        x: T,
        y: T,
        limits: (T, T),
        lower: &Bin<T>,
        upper: &Bin<T>,
        tol: &Tolerances,
    ) -> T {
        if x == lower.primary {
            return lower.secondary.evaluate_cdf(y);
        }
        if x == upper.primary {
            return upper.secondary.evaluate_cdf(y);
        }

        Self::evaluate_cdf_within_limits(x, y, lower, upper, limits, tol)
    }

    fn sample_cos_detailed<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        rng: &mut dyn RngCore,
        random_number: Option<T>,
        sample: &mut SampleFn<'_, T>,
        tol: &Tolerances,
    ) -> Sample<T> {
        Self::sample_detailed(x, lower, upper, rng, random_number, sample, tol)
    }

    fn sample_cos_in_subrange<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        rng: &mut dyn RngCore,
        max: T,
        sample: &mut SubrangeSampleFn<'_, T>,
        tol: &Tolerances,
    ) -> T {
        Self::sample_in_subrange(x, lower, upper, rng, max, sample, tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::{LinLinLin, LogLogCosLog};
    use crate::random::FakeStream;
    use crate::univariate::{TabularDistribution, TabularUnivariateDistribution, UniformDistribution};
    use approx::assert_relative_eq;

    fn bins() -> (UniformDistribution<f64>, UniformDistribution<f64>) {
        (
            UniformDistribution::new(0.0, 1.0, 1.0).unwrap(),
            UniformDistribution::new(0.0, 3.0, 1.0).unwrap(),
        )
    }

    #[test]
    fn evaluate() {
        let tol = Tolerances::default();
        let (d0, d1) = bins();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };

        type G = Correlated<LinLinLin>;
        for &y in &[0.0, 0.3, 1.0, 1.7, 2.0] {
            assert_relative_eq!(
                G::evaluate_pdf(0.5, y, &lower, &upper, Evaluation::Pdf, &tol),
                0.5,
                max_relative = 1e-12
            );
        }
        assert_eq!(G::evaluate_pdf(0.5, 2.5, &lower, &upper, Evaluation::Pdf, &tol), 0.0);
        assert_relative_eq!(G::evaluate_cdf(0.5, 1.0, &lower, &upper, &tol), 0.5, max_relative = 1e-7);
        assert_relative_eq!(G::evaluate_cdf(0.5, 0.3, &lower, &upper, &tol), 0.15, max_relative = 1e-6);
        assert_eq!(G::evaluate_cdf(0.5, 0.0, &lower, &upper, &tol), 0.0);
        assert_eq!(G::evaluate_cdf(0.5, 2.0, &lower, &upper, &tol), 1.0);
    }

    #[test]
    fn evaluate_cos() {
        let tol = Tolerances::default();
        let d0 = TabularDistribution::new(vec![-1.0, 0.0, 0.999999], vec![0.1, 0.5, 1.0]).unwrap();
        let d1 = TabularDistribution::new(vec![-1.0, 0.0, 0.999999], vec![1.0, 5.0, 10.0]).unwrap();
        let lower = Bin { primary: 1.0, secondary: &d0 };
        let upper = Bin { primary: 2.0, secondary: &d1 };

        type G = Correlated<LogLogCosLog>;
        let z = G::evaluate_pdf_cos(1.5, -1.0, (-1.0, 0.999999), &lower, &upper, Evaluation::Value, &tol);
        assert_relative_eq!(z, 2.1117818980603434e-01, max_relative = 1e-14);
        let z = G::evaluate_pdf_cos(1.5, 1.0, (-1.0, 0.999999), &lower, &upper, Evaluation::Value, &tol);
        assert_eq!(z, 0.0);
    }

    #[test]
    fn sample() {
        let tol = Tolerances::default();
        let (d0, d1) = bins();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };

        type G = Correlated<LinLinLin>;
        let mut sample = |d: &dyn TabularUnivariateDistribution<f64>, r: f64| d.sample_with_random_number(r);

        let mut rng = FakeStream::new(vec![0.5, 0.25]);
        let s = G::sample_detailed(0.5, &lower, &upper, &mut rng, None, &mut sample, &tol);
        assert_eq!(s.value, 1.0);
        assert_eq!(s.raw, 0.5);
        assert_eq!(s.side, BinSide::Lower);
        assert_eq!(rng.position(), 1);

        let s = G::sample_detailed(1.0, &lower, &upper, &mut rng, None, &mut sample, &tol);
        assert_eq!(s.value, 0.75);
        assert_eq!(s.side, BinSide::Upper);

        let mut sample = |d: &dyn TabularUnivariateDistribution<f64>, max: f64| {
            d.sample_with_random_number_in_subrange(0.5, max)
        };
        let y = G::sample_in_subrange(0.5, &lower, &upper, &mut rng, 2.0, &mut sample, &tol);
        assert_eq!(y, 0.75);
    }

    #[test]
    fn sample_records_lower_bin() {
        let tol = Tolerances::default();
        let d0 = TabularDistribution::new(vec![0.0, 0.5, 1.0], vec![1.0, 1.0, 1.0]).unwrap();
        let d1 = UniformDistribution::new(0.0, 3.0, 1.0).unwrap();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };

        type G = Correlated<LinLinLin>;
        let (mut calls, mut index) = (Vec::new(), 0);
        let mut sample = |d: &dyn TabularUnivariateDistribution<f64>, r: f64| {
            let y = d.sample_with_random_number_and_record_bin_index(r, &mut index);
            calls.push(y);
            y
        };

        let mut rng = FakeStream::new(vec![0.0]);
        let s = G::sample_detailed(0.5, &lower, &upper, &mut rng, Some(0.75), &mut sample, &tol);
        drop(sample);

        assert_eq!(calls, vec![2.25, 0.75]);
        assert_eq!(index, 1);
        assert_eq!(s.raw, 0.75);
        assert_eq!(s.side, BinSide::Lower);
        assert_relative_eq!(s.value, 1.5, max_relative = 1e-15);
    }
}
