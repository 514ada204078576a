use super::{choose_bin_side, evaluate_bin_snapped, grid_length, intermediate_limits};
use super::{resolve_random_number, Direct};
use super::{Bin, Evaluation, GridPolicy, Sample, SampleFn, SubrangeSampleFn};
use crate::bivariate::Tolerances;
use crate::interpolation::{fuzzy_lower_bound, fuzzy_upper_bound, OneDInterpolation, TwoDInterpolation};
use crate::num::Float;
use rand_core::RngCore;
use std::marker::PhantomData;

/// Unit-base grid policy.
///
/// The secondary distributions of both bins are mapped onto a unit-base
/// grid, combined there and mapped back onto the intermediate secondary grid,
/// whose limits are interpolated from the limits of the two bins. Samples are
/// drawn from one of the two bins chosen at random and rescaled onto the
/// intermediate grid.
///
/// Cosine variables are handled by the [`Direct`] policy.
#[derive(Copy, Clone, Debug, Default)]
pub struct UnitBase<I> {
    phantom_interp: PhantomData<I>,
}

impl<I: TwoDInterpolation> UnitBase<I> {
    // Maps a sample of a bin onto the intermediate grid.
    fn rescale<T: Float>(
        raw: T,
        bin: &Bin<T>,
        (y_min, grid_length): (T, T),
        bin_grid_length: T,
        tol: T,
    ) -> T {
        let eta = I::ZY::calculate_unit_base_indep_var(raw, bin.lower_bound(), bin_grid_length, tol);

        I::ZY::calculate_indep_var(eta, y_min, grid_length, tol)
    }
}

impl<I: TwoDInterpolation> GridPolicy for UnitBase<I> {
    const NAME: &'static str = "UnitBase";

    type Interp = I;
    type CosGrid = Direct<I>;

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

        I::interpolate_unit_base(
            (lower.primary, upper.primary, x),
            y,
            intermediate_limits::<I, T>(x, lower, upper),
            (lower.lower_bound(), lower.upper_bound()),
            (upper.lower_bound(), upper.upper_bound()),
            |y| method.apply(lower.secondary, y),
            |y| method.apply(upper.secondary, y),
            (T::ZERO, T::ZERO),
            T::cast_f64(tol.fuzzy_boundary),
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

        let fuzz = T::cast_f64(tol.fuzzy_boundary);
        let (y_min, y_max) = intermediate_limits::<I, T>(x, lower, upper);
        if y < fuzzy_lower_bound(y_min, fuzz) {
            return T::ZERO;
        }
        if y > fuzzy_upper_bound(y_max, fuzz) {
            return T::ONE;
        }

        let (x0, x1) = (lower.primary, upper.primary);
        let l0 = grid_length::<I, T>(lower);
        let l1 = grid_length::<I, T>(upper);
        let l = I::calculate_intermediate_grid_length(x0, x1, x, l0, l1);

        let eta = I::ZY::calculate_unit_base_indep_var(y, y_min, l, fuzz);
        let y0 = I::ZY::calculate_indep_var(eta, lower.lower_bound(), l0, fuzz);
        let y1 = I::ZY::calculate_indep_var(eta, upper.lower_bound(), l1, fuzz);

        let c0 = lower.secondary.evaluate_cdf(y0);
        let c1 = upper.secondary.evaluate_cdf(y1);
        if c0 == c1 {
            c0
        } else {
            I::interpolate_dependent(x0, x1, x, c0, c1)
        }
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
        let side = choose_bin_side::<I, T>(x, lower, upper, rng);
        let r = resolve_random_number(rng, random_number);
        let bin = side.select(lower, upper);

        let raw = sample(bin.secondary, r);
        if x == bin.primary {
            return Sample::unscaled(raw, side);
        }

        let (x0, x1) = (lower.primary, upper.primary);
        let l_bin = grid_length::<I, T>(bin);
        let l = I::calculate_intermediate_grid_length(
            x0,
            x1,
            x,
            grid_length::<I, T>(lower),
            grid_length::<I, T>(upper),
        );
        let y_min = Self::calculate_lower_bound(x, lower, upper);
        let value = Self::rescale(raw, bin, (y_min, l), l_bin, T::cast_f64(tol.fuzzy_boundary));

        Sample { value, raw, side }
    }

    fn sample_in_subrange<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        rng: &mut dyn RngCore,
        max: T,
        sample: &mut SubrangeSampleFn<'_, T>,
        tol: &Tolerances,
    ) -> T {
        let side = choose_bin_side::<I, T>(x, lower, upper, rng);
        let bin = side.select(lower, upper);
        if x == bin.primary {
            return sample(bin.secondary, max.min(bin.upper_bound()));
        }

        let fuzz = T::cast_f64(tol.fuzzy_boundary);
        let (x0, x1) = (lower.primary, upper.primary);
        let l_bin = grid_length::<I, T>(bin);
        let l = I::calculate_intermediate_grid_length(
            x0,
            x1,
            x,
            grid_length::<I, T>(lower),
            grid_length::<I, T>(upper),
        );
        let (y_min, y_max) = intermediate_limits::<I, T>(x, lower, upper);

        // Maximum mapped onto the grid of the sampled bin.
        let bin_max = if max < y_max {
            let eta_max = I::ZY::calculate_unit_base_indep_var(max, y_min, l, fuzz);
            I::ZY::calculate_indep_var(eta_max, bin.lower_bound(), l_bin, fuzz).min(bin.upper_bound())
        } else {
            bin.upper_bound()
        };

        let raw = sample(bin.secondary, bin_max);

        Self::rescale(raw, bin, (y_min, l), l_bin, fuzz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::{LinLinLin, LinLogLin};
    use crate::random::FakeStream;
    use crate::univariate::{TabularUnivariateDistribution, UniformDistribution, UnivariateDistribution};
    use approx::assert_relative_eq;

    fn bins() -> (UniformDistribution<f64>, UniformDistribution<f64>) {
        (
            UniformDistribution::new(0.0, 1.0, 1.0).unwrap(),
            UniformDistribution::new(0.0, 3.0, 1.0).unwrap(),
        )
    }

    #[test]
    fn bounds() {
        let (d0, d1) = bins();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };

        type G = UnitBase<LinLinLin>;
        assert_eq!(G::calculate_lower_bound(0.5, &lower, &upper), 0.0);
        assert_eq!(G::calculate_upper_bound(0.5, &lower, &upper), 2.0);
        assert_eq!(G::calculate_upper_bound(1.0, &lower, &upper), 3.0);

        let d0 = UniformDistribution::new(1.0, 10.0, 1.0).unwrap();
        let d1 = UniformDistribution::new(1.0, 1000.0, 1.0).unwrap();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };
        type H = UnitBase<LinLogLin>;
        assert_relative_eq!(H::calculate_upper_bound(0.5, &lower, &upper), 100.0, max_relative = 1e-14);
    }

    #[test]
    fn evaluate() {
        let tol = Tolerances::default();
        let (d0, d1) = bins();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };

        type G = UnitBase<LinLinLin>;
        assert_relative_eq!(
            G::evaluate_pdf(0.5, 1.5, &lower, &upper, Evaluation::Pdf, &tol),
            0.5,
            max_relative = 1e-15
        );
        assert_eq!(G::evaluate_pdf(0.5, 2.5, &lower, &upper, Evaluation::Pdf, &tol), 0.0);
        assert_eq!(G::evaluate_pdf(0.0, 1.0005, &lower, &upper, Evaluation::Pdf, &tol), 1.0);
        assert_eq!(G::evaluate_pdf(0.0, 1.5, &lower, &upper, Evaluation::Pdf, &tol), 0.0);

        assert_relative_eq!(G::evaluate_cdf(0.5, 0.5, &lower, &upper, &tol), 0.25, max_relative = 1e-15);
        assert_eq!(G::evaluate_cdf(0.5, -1.0, &lower, &upper, &tol), 0.0);
        assert_eq!(G::evaluate_cdf(0.5, 2.5, &lower, &upper, &tol), 1.0);
        assert_eq!(G::evaluate_cdf(1.0, 1.5, &lower, &upper, &tol), 0.5);
    }

    #[test]
    fn sample() {
        let tol = Tolerances::default();
        let (d0, d1) = bins();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };

        type G = UnitBase<LinLinLin>;
        let mut sample = |d: &dyn TabularUnivariateDistribution<f64>, r: f64| d.sample_with_random_number(r);

        let mut rng = FakeStream::new(vec![0.75, 0.5]);
        let s = G::sample_detailed(0.5, &lower, &upper, &mut rng, None, &mut sample, &tol);
        assert_eq!(s.side, crate::grid::BinSide::Lower);
        assert_eq!(s.raw, 0.5);
        assert_relative_eq!(s.value, 1.0, max_relative = 1e-15);

        let mut rng = FakeStream::new(vec![0.25]);
        let s = G::sample_detailed(0.5, &lower, &upper, &mut rng, Some(0.5), &mut sample, &tol);
        assert_eq!(s.side, crate::grid::BinSide::Upper);
        assert_eq!(s.raw, 1.5);
        assert_relative_eq!(s.value, 1.0, max_relative = 1e-15);
    }

    #[test]
    fn sample_in_subrange() {
        let tol = Tolerances::default();
        let (d0, d1) = bins();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };

        type G = UnitBase<LinLinLin>;
        let mut sample = |d: &dyn TabularUnivariateDistribution<f64>, max: f64| {
            d.sample_with_random_number_in_subrange(0.5, max)
        };

        // The maximum maps onto 0.5 in the lower bin and 1.5 in the upper bin.
        let mut rng = FakeStream::new(vec![0.75]);
        let y = G::sample_in_subrange(0.5, &lower, &upper, &mut rng, 1.0, &mut sample, &tol);
        assert_relative_eq!(y, 0.5, max_relative = 1e-15);
        let mut rng = FakeStream::new(vec![0.25]);
        let y = G::sample_in_subrange(0.5, &lower, &upper, &mut rng, 1.0, &mut sample, &tol);
        assert_relative_eq!(y, 0.5, max_relative = 1e-15);
        let mut rng = FakeStream::new(vec![0.25]);
        let y = G::sample_in_subrange(0.5, &lower, &upper, &mut rng, 5.0, &mut sample, &tol);
        assert_relative_eq!(y, 1.0, max_relative = 1e-15);
    }
}
