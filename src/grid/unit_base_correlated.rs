use super::{correlated_density, estimate_cdf, evaluate_bin_snapped, grid_length};
use super::{intermediate_limits, primary_fraction, resolve_random_number, BinSide, Correlated};
use super::{Bin, Evaluation, GridPolicy, Sample, SampleFn, SubrangeSampleFn};
use crate::bivariate::Tolerances;
use crate::interpolation::{LinLin, OneDInterpolation, TwoDInterpolation};
use crate::num::Float;
use crate::univariate::UnivariateDistribution;
use rand_core::RngCore;
use std::marker::PhantomData;

/// Unit-base correlated grid policy.
///
/// The secondary distributions of both bins are mapped onto a unit-base
/// grid and combined there at equal values of their CDF. The combined
/// unit-base coordinate is then mapped back onto the intermediate secondary
/// grid.
///
/// As with the [`Correlated`] policy, the raw sample and the recorded
/// secondary bin are those of the lower bin.
///
/// Cosine variables are handled by the [`Correlated`] policy.
#[derive(Copy, Clone, Debug, Default)]
pub struct UnitBaseCorrelated<I> {
    phantom_interp: PhantomData<I>,
}

impl<I: TwoDInterpolation> UnitBaseCorrelated<I> {
    // Unit-base coordinate of `y` on a grid of length `grid_length` starting
    // at `y_min`.
    fn unit_base_coordinate<T: Float>(y: T, y_min: T, grid_length: T, tol: T) -> T {
        if grid_length > T::ZERO {
            I::ZY::calculate_unit_base_indep_var(y, y_min, grid_length, tol)
        } else {
            T::ZERO
        }
    }

    // Interpolated unit-base coordinate at the common CDF value `c`.
    fn unit_base_coordinate_at_cdf<T: Float>(
        beta: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        (l0, l1): (T, T),
        c: T,
        tol: T,
    ) -> T {
        let y0 = lower.secondary.sample_with_random_number(c);
        let y1 = upper.secondary.sample_with_random_number(c);
        let eta0 = Self::unit_base_coordinate(y0, lower.lower_bound(), l0, tol);
        let eta1 = Self::unit_base_coordinate(y1, upper.lower_bound(), l1, tol);

        LinLin::interpolate_beta(beta, eta0, eta1)
    }

    // Common CDF value of the unit-base coordinate `eta`.
    fn cdf_at_unit_base_coordinate<T: Float>(
        beta: T,
        eta: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        (l0, l1): (T, T),
        tol: &Tolerances,
    ) -> T {
        let fuzz = T::cast_f64(tol.fuzzy_boundary);
        let y0 = I::ZY::calculate_indep_var(eta, lower.lower_bound(), l0, fuzz);
        let y1 = I::ZY::calculate_indep_var(eta, upper.lower_bound(), l1, fuzz);
        let initial = (
            lower.secondary.evaluate_cdf(y0),
            upper.secondary.evaluate_cdf(y1),
        );

        estimate_cdf(
            eta,
            initial,
            (0.99, 1.01),
            |c| Self::unit_base_coordinate_at_cdf(beta, lower, upper, (l0, l1), c, fuzz),
            tol,
        )
    }

    // Combines two samples drawn at the same CDF value, each given with the
    // unit-base grid length it was drawn on, onto the intermediate grid
    // starting at `y_min` with length `grid_length`.
    pub(super) fn combine<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        (y0, l0): (T, T),
        (y1, l1): (T, T),
        (y_min, grid_length): (T, T),
        tol: &Tolerances,
    ) -> T {
        let fuzz = T::cast_f64(tol.fuzzy_boundary);
        let eta0 = Self::unit_base_coordinate(y0, lower.lower_bound(), l0, fuzz);
        let eta1 = Self::unit_base_coordinate(y1, upper.lower_bound(), l1, fuzz);

        let eta = if eta0 == eta1 {
            eta0
        } else {
            LinLin::interpolate_beta(primary_fraction::<I, T>(x, lower, upper), eta0, eta1)
        };

        I::ZY::calculate_indep_var(eta, y_min, grid_length, fuzz)
    }

    // Unit-base grid lengths of both bins and of the intermediate grid.
    pub(super) fn grid_lengths<T: Float>(x: T, lower: &Bin<T>, upper: &Bin<T>) -> (T, T, T) {
        let l0 = grid_length::<I, T>(lower);
        let l1 = grid_length::<I, T>(upper);
        let l = I::calculate_intermediate_grid_length(lower.primary, upper.primary, x, l0, l1);

        (l0, l1, l)
    }
}

impl<I: TwoDInterpolation> GridPolicy for UnitBaseCorrelated<I> {
    const NAME: &'static str = "UnitBaseCorrelated";

    type Interp = I;
    type CosGrid = Correlated<I>;

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
            return evaluate_bin_snapped(lower, y, method, (T::ZERO, T::ZERO), tol);
        }
        if x == upper.primary {
            return evaluate_bin_snapped(upper, y, method, (T::ZERO, T::ZERO), tol);
        }

        let (y_min, y_max) = intermediate_limits::<I, T>(x, lower, upper);
        if y < y_min || y > y_max {
            return T::ZERO;
        }

        let (l0, l1, l) = Self::grid_lengths(x, lower, upper);
        let beta = primary_fraction::<I, T>(x, lower, upper);

        let (y0, y1) = if y == y_min {
            (lower.lower_bound(), upper.lower_bound())
        } else if y == y_max {
            (lower.upper_bound(), upper.upper_bound())
        } else {
            let fuzz = T::cast_f64(tol.fuzzy_boundary);
            let eta = I::ZY::calculate_unit_base_indep_var(y, y_min, l, fuzz);
            let c = Self::cdf_at_unit_base_coordinate(beta, eta, lower, upper, (l0, l1), tol);
            (
                lower.secondary.sample_with_random_number(c),
                upper.secondary.sample_with_random_number(c),
            )
        };

        let f0 = method.apply(lower.secondary, y0);
        let f1 = method.apply(upper.secondary, y1);

        let processing = I::ZY::INDEP;
        correlated_density(
            beta,
            l0 * processing.inverse_derivative(y0) * f0,
            l1 * processing.inverse_derivative(y1) * f1,
            l * processing.inverse_derivative(y),
        )
    }

    fn evaluate_cdf<T: Float>(x: T, y: T, lower: &Bin<T>, upper: &Bin<T>, tol: &Tolerances) -> T {
        let below_above = (T::ZERO, T::ONE);
        if x == lower.primary {
            return evaluate_bin_snapped(lower, y, Evaluation::Cdf, below_above, tol);
        }
        if x == upper.primary {
            return evaluate_bin_snapped(upper, y, Evaluation::Cdf, below_above, tol);
        }

        let (y_min, y_max) = intermediate_limits::<I, T>(x, lower, upper);
        if y <= y_min {
            return T::ZERO;
        }
        if y >= y_max {
            return T::ONE;
        }

        let (l0, l1, l) = Self::grid_lengths(x, lower, upper);
        let beta = primary_fraction::<I, T>(x, lower, upper);
        let eta = I::ZY::calculate_unit_base_indep_var(y, y_min, l, T::cast_f64(tol.fuzzy_boundary));

        Self::cdf_at_unit_base_coordinate(beta, eta, lower, upper, (l0, l1), tol)
    }

    fn sample_detailed<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        rng: &mut dyn RngCore,
        random_number: Option<T>,
        sample: &mut SampleFn<'_, T>,
        tol: &Tolerances,
    ) -> Sample<T> {
        let r = resolve_random_number(rng, random_number);
        if x == upper.primary {
            return Sample::unscaled(sample(upper.secondary, r), BinSide::Upper);
        }
        if x == lower.primary {
            return Sample::unscaled(sample(lower.secondary, r), BinSide::Lower);
        }

        let (y_min, y_max) = intermediate_limits::<I, T>(x, lower, upper);
        if y_min == y_max {
            return Sample::unscaled(y_min, BinSide::Lower);
        }
        let (l0, l1, l) = Self::grid_lengths(x, lower, upper);

        // The lower bin is sampled last so that it is the one recorded.
        let y1 = sample(upper.secondary, r);
        let y0 = sample(lower.secondary, r);

        Sample {
            value: Self::combine(x, lower, upper, (y0, l0), (y1, l1), (y_min, l), tol),
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
        tol: &Tolerances,
    ) -> T {
        let max0 = max.min(lower.upper_bound());
        let max1 = max.min(upper.upper_bound());
        if x == upper.primary {
            return sample(upper.secondary, max1);
        }
        if x == lower.primary {
            return sample(lower.secondary, max0);
        }

        // Grids truncated at the subrange maximum.
        let l0 = I::ZY::calculate_unit_base_grid_length(lower.lower_bound(), max0);
        let l1 = I::ZY::calculate_unit_base_grid_length(upper.lower_bound(), max1);
        let (y_min, y_max) = intermediate_limits::<I, T>(x, lower, upper);
        let l = I::ZY::calculate_unit_base_grid_length(y_min, max.min(y_max));

        let y1 = sample(upper.secondary, max1);
        let y0 = sample(lower.secondary, max0);
        if !(l > T::ZERO) {
            return y_min;
        }

        Self::combine(x, lower, upper, (y0, l0), (y1, l1), (y_min, l), tol)
    }
}
