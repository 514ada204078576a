use super::{choose_bin_side, resolve_random_number};
use super::{Bin, Evaluation, GridPolicy, Sample, SampleFn, SubrangeSampleFn};
use crate::bivariate::Tolerances;
use crate::interpolation::TwoDInterpolation;
use crate::num::Float;
use crate::univariate::{TabularUnivariateDistribution, UnivariateDistribution};
use rand_core::RngCore;
use std::marker::PhantomData;

/// Direct grid policy.
///
/// The secondary distributions of both bins are evaluated at the same
/// secondary value and the results are interpolated against the primary
/// value. Samples are drawn from one of the two bins, chosen at random with
/// a probability given by the fractional position of the primary value.
#[derive(Copy, Clone, Debug, Default)]
pub struct Direct<I> {
    phantom_interp: PhantomData<I>,
}

impl<I: TwoDInterpolation> Direct<I> {
    fn evaluate<T: Float>(x: T, y: T, lower: &Bin<T>, upper: &Bin<T>, method: Evaluation) -> T {
        if x == lower.primary {
            method.apply(lower.secondary, y)
        } else if x == upper.primary {
            method.apply(upper.secondary, y)
        } else {
            let z0 = method.apply(lower.secondary, y);
            let z1 = method.apply(upper.secondary, y);

            I::interpolate_dependent(lower.primary, upper.primary, x, z0, z1)
        }
    }
}

impl<I: TwoDInterpolation> GridPolicy for Direct<I> {
    const NAME: &'static str = "Direct";

    type Interp = I;
    type CosGrid = Self;

    fn calculate_lower_bound<T: Float>(x: T, lower: &Bin<T>, upper: &Bin<T>) -> T {
        if x == lower.primary {
            lower.lower_bound()
        } else if x == upper.primary {
            upper.lower_bound()
        } else {
            lower.lower_bound().min(upper.lower_bound())
        }
    }

    fn calculate_upper_bound<T: Float>(x: T, lower: &Bin<T>, upper: &Bin<T>) -> T {
        if x == lower.primary {
            lower.upper_bound()
        } else if x == upper.primary {
            upper.upper_bound()
        } else {
            lower.upper_bound().max(upper.upper_bound())
        }
    }

    fn evaluate_pdf<T: Float>(
        x: T,
        y: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        method: Evaluation,
        _tol: &Tolerances,
    ) -> T {
        Self::evaluate(x, y, lower, upper, method)
    }

    fn evaluate_cdf<T: Float>(x: T, y: T, lower: &Bin<T>, upper: &Bin<T>, _tol: &Tolerances) -> T {
        Self::evaluate(x, y, lower, upper, Evaluation::Cdf)
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
        let side = choose_bin_side::<I, T>(x, lower, upper, rng);
        let r = resolve_random_number(rng, random_number);
        let bin = side.select(lower, upper);

        Sample::unscaled(sample(bin.secondary, r), side)
    }

    fn sample_in_subrange<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        rng: &mut dyn RngCore,
        max: T,
        sample: &mut SubrangeSampleFn<'_, T>,
        _tol: &Tolerances,
    ) -> T {
        let side = choose_bin_side::<I, T>(x, lower, upper, rng);
        let bin = side.select(lower, upper);

        sample(bin.secondary, max.min(bin.upper_bound()))
    }

    fn evaluate_pdf_cos<T: Float>(
        x: T,
        y: T,
        _limits: (T, T),
        lower: &Bin<T>,
        upper: &Bin<T>,
        method: Evaluation,
        _tol: &Tolerances,
    ) -> T {
        Self::evaluate(x, y, lower, upper, method)
    }

    fn evaluate_cdf_cos<T: Float>(
        x: T,
        y: T,
        _limits: (T, T),
        lower: &Bin<T>,
        upper: &Bin<T>,
        _tol: &Tolerances,
    ) -> T {
        Self::evaluate(x, y, lower, upper, Evaluation::Cdf)
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
