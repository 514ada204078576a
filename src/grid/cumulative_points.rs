use super::{choose_bin_side, evaluate_bin_snapped, intermediate_limits, primary_fraction};
use super::{resolve_random_number, BinSide, Correlated, UnitBaseCorrelated};
use super::{Bin, Evaluation, GridPolicy, Sample, SampleFn, SubrangeSampleFn};
use crate::bivariate::Tolerances;
use crate::interpolation::TwoDInterpolation;
use crate::num::Float;
use crate::search::find_lower_bin_index;
use crate::univariate::UnivariateDistribution;
use rand_core::RngCore;
use std::borrow::Cow;
use std::marker::PhantomData;

/// Cumulative-points grid policy.
///
/// Samples are drawn from a single bin, chosen at random with a probability
/// given by the fractional position of the primary value. The tabulated
/// points of the chosen bin are carried onto the intermediate grid at their
/// cumulative value, as with the [`UnitBaseCorrelated`] policy, and the
/// sample is mapped linearly between the two carried points bracketing it.
/// A sample falling on a tabulated point is therefore mapped exactly onto
/// the intermediate position of that point.
///
/// The conditional distribution is the mixture of both mapped bins. Only
/// the chosen bin goes through the sampling functor, so the raw sample and
/// the recorded secondary bin are always those of the chosen bin.
///
/// Cosine variables are handled by the [`Correlated`] policy.
#[derive(Copy, Clone, Debug, Default)]
pub struct CumulativePoints<I> {
    phantom_interp: PhantomData<I>,
}

// Piecewise linear map between the support of one bin and the
// intermediate grid.
struct CumulativeMap<'a, I, T: Float> {
    x: T,
    lower: Bin<'a, T>,
    upper: Bin<'a, T>,
    side: BinSide,
    points: Cow<'a, [T]>,
    limits: (T, T),
    lengths: (T, T, T),
    phantom_interp: PhantomData<I>,
}

impl<'a, I: TwoDInterpolation, T: Float> CumulativeMap<'a, I, T> {
    fn new(x: T, lower: &Bin<'a, T>, upper: &Bin<'a, T>, side: BinSide) -> Self {
        Self {
            x,
            lower: *lower,
            upper: *upper,
            side,
            points: side.select(lower, upper).secondary.grid_points(),
            limits: intermediate_limits::<I, T>(x, lower, upper),
            lengths: UnitBaseCorrelated::<I>::grid_lengths(x, lower, upper),
            phantom_interp: PhantomData,
        }
    }

    // Intermediate position of the `k`-th tabulated point.
    fn intermediate_point(&self, k: usize, tol: &Tolerances) -> T {
        if k == 0 {
            return self.limits.0;
        }
        if k + 1 >= self.points.len() {
            return self.limits.1;
        }

        let bin = self.side.select(&self.lower, &self.upper);
        let partner = self.side.select(&self.upper, &self.lower);
        let y = self.points[k];
        let y_partner = partner.secondary.sample_with_random_number(bin.secondary.evaluate_cdf(y));
        let (y0, y1) = self.side.select((y, y_partner), (y_partner, y));
        let (l0, l1, l) = self.lengths;

        UnitBaseCorrelated::<I>::combine(
            self.x,
            &self.lower,
            &self.upper,
            (y0, l0),
            (y1, l1),
            (self.limits.0, l),
            tol,
        )
    }

    // Maps a value of the bin support onto the intermediate grid.
    fn forward(&self, y: T, tol: &Tolerances) -> T {
        let last = self.points.len() - 1;
        if y <= self.points[0] {
            return self.limits.0;
        }
        if y >= self.points[last] {
            return self.limits.1;
        }
        let k = match find_lower_bin_index(self.points.as_ref(), y) {
            Ok(k) => k,
            Err(_) => return y,
        };

        let (y_k, y_next) = (self.points[k], self.points[k + 1]);
        let (z_k, z_next) = (self.intermediate_point(k, tol), self.intermediate_point(k + 1, tol));
        let t = (y - y_k) / (y_next - y_k);

        (z_k + t * (z_next - z_k)).max(z_k).min(z_next)
    }

    // Maps a value of the intermediate grid back onto the bin support.
    // Returns the value and the derivative of the inverse map.
    fn inverse(&self, z: T, tol: &Tolerances) -> (T, T) {
        // Invariant: z_lo <= z < z_hi.
        let (mut lo, mut hi) = (0, self.points.len() - 1);
        let (mut z_lo, mut z_hi) = self.limits;
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            let z_mid = self.intermediate_point(mid, tol);
            if z_mid <= z {
                lo = mid;
                z_lo = z_mid;
            } else {
                hi = mid;
                z_hi = z_mid;
            }
        }

        let (y_lo, y_hi) = (self.points[lo], self.points[hi]);
        if !(z_hi > z_lo) {
            return (y_lo, T::ZERO);
        }
        let slope = (y_hi - y_lo) / (z_hi - z_lo);

        ((y_lo + (z - z_lo) * slope).max(y_lo).min(y_hi), slope)
    }
}

impl<I: TwoDInterpolation> GridPolicy for CumulativePoints<I> {
    const NAME: &'static str = "CumulativePoints";

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

        let mapped = |side: BinSide| {
            let (y_bin, slope) = CumulativeMap::<I, T>::new(x, lower, upper, side).inverse(y, tol);
            method.apply(side.select(lower, upper).secondary, y_bin) * slope
        };
        let beta = primary_fraction::<I, T>(x, lower, upper);

        (T::ONE - beta) * mapped(BinSide::Lower) + beta * mapped(BinSide::Upper)
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

        let mapped = |side: BinSide| {
            let (y_bin, _) = CumulativeMap::<I, T>::new(x, lower, upper, side).inverse(y, tol);
            side.select(lower, upper).secondary.evaluate_cdf(y_bin)
        };
        let beta = primary_fraction::<I, T>(x, lower, upper);

        ((T::ONE - beta) * mapped(BinSide::Lower) + beta * mapped(BinSide::Upper)).min(T::ONE)
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

        if x == bin.primary {
            return Sample::unscaled(sample(bin.secondary, r), side);
        }

        let (y_min, y_max) = intermediate_limits::<I, T>(x, lower, upper);
        if y_min == y_max {
            return Sample::unscaled(y_min, side);
        }

        let raw = sample(bin.secondary, r);
        let value = CumulativeMap::<I, T>::new(x, lower, upper, side).forward(raw, tol);

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

        let (y_min, y_max) = intermediate_limits::<I, T>(x, lower, upper);
        if y_min == y_max {
            return y_min;
        }

        let map = CumulativeMap::<I, T>::new(x, lower, upper, side);
        let bin_max = if max >= y_max {
            bin.upper_bound()
        } else {
            map.inverse(max.max(y_min), tol).0
        };

        map.forward(sample(bin.secondary, bin_max), tol).min(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::LinLinLin;
    use crate::random::FakeStream;
    use crate::univariate::{TabularDistribution, TabularUnivariateDistribution, UniformDistribution};
    use approx::assert_relative_eq;

    // Flat density with an interior point at 0.5, and a linear density.
    fn skewed_bins() -> (TabularDistribution<f64>, TabularDistribution<f64>) {
        (
            TabularDistribution::new(vec![0.0, 0.5, 1.0], vec![1.0, 1.0, 1.0]).unwrap(),
            TabularDistribution::new(vec![0.0, 2.0], vec![0.0, 2.0]).unwrap(),
        )
    }

    // Intermediate position of the interior point of the flat bin at x = 0.5.
    fn carried_point() -> f64 {
        0.75 * (0.5 + 0.5f64.sqrt())
    }

    #[test]
    fn sample() {
        let tol = Tolerances::default();
        let d0 = UniformDistribution::new(0.0, 1.0, 1.0).unwrap();
        let d1 = UniformDistribution::new(1.0, 4.0, 1.0).unwrap();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };

        type G = CumulativePoints<LinLinLin>;
        let mut calls = Vec::new();
        let mut sample = |d: &dyn TabularUnivariateDistribution<f64>, r: f64| {
            let y = d.sample_with_random_number(r);
            calls.push(y);
            y
        };

        // Upper bin chosen.
        let mut rng = FakeStream::new(vec![0.25, 0.5]);
        let s = G::sample_detailed(0.5, &lower, &upper, &mut rng, None, &mut sample, &tol);
        assert_eq!(s.side, BinSide::Upper);
        assert_eq!(s.raw, 2.5);
        assert_relative_eq!(s.value, 1.5, max_relative = 1e-15);

        // Lower bin chosen.
        let mut rng = FakeStream::new(vec![0.75, 0.5]);
        let s = G::sample_detailed(0.5, &lower, &upper, &mut rng, None, &mut sample, &tol);
        assert_eq!(s.side, BinSide::Lower);
        assert_eq!(s.raw, 0.5);
        assert_relative_eq!(s.value, 1.5, max_relative = 1e-15);

        drop(sample);
        assert_eq!(calls, vec![2.5, 0.5]);
    }

    #[test]
    fn sample_tabulated_points() {
        let tol = Tolerances::default();
        let (d0, d1) = skewed_bins();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };
        let mut sample = |d: &dyn TabularUnivariateDistribution<f64>, r: f64| d.sample_with_random_number(r);

        // Intermediate grid [0, 1.5].
        type G = CumulativePoints<LinLinLin>;
        assert_eq!(G::calculate_lower_bound(0.5, &lower, &upper), 0.0);
        assert_eq!(G::calculate_upper_bound(0.5, &lower, &upper), 1.5);

        // A sample on the interior point lands on its carried position.
        let mut rng = FakeStream::new(vec![0.75, 0.5]);
        let s = G::sample_detailed(0.5, &lower, &upper, &mut rng, None, &mut sample, &tol);
        assert_eq!(s.side, BinSide::Lower);
        assert_eq!(s.raw, 0.5);
        assert_relative_eq!(s.value, carried_point(), max_relative = 1e-12);

        // Between tabulated points the sample is mapped linearly.
        let mut rng = FakeStream::new(vec![0.75, 0.25]);
        let s = G::sample_detailed(0.5, &lower, &upper, &mut rng, None, &mut sample, &tol);
        assert_relative_eq!(s.raw, 0.25, max_relative = 1e-12);
        assert_relative_eq!(s.value, 0.5 * carried_point(), max_relative = 1e-12);

        // The upper bin only has its end points.
        let mut rng = FakeStream::new(vec![0.25, 0.25]);
        let s = G::sample_detailed(0.5, &lower, &upper, &mut rng, None, &mut sample, &tol);
        assert_eq!(s.side, BinSide::Upper);
        assert_relative_eq!(s.raw, 1.0, max_relative = 1e-12);
        assert_relative_eq!(s.value, 0.75, max_relative = 1e-12);
    }

    #[test]
    fn differs_from_unit_base_correlated() {
        let tol = Tolerances::default();
        let (d0, d1) = skewed_bins();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };
        let mut sample = |d: &dyn TabularUnivariateDistribution<f64>, r: f64| d.sample_with_random_number(r);

        // Lower bin chosen, with the same random number for both policies.
        let mut rng = FakeStream::new(vec![0.75, 0.25]);
        let s = CumulativePoints::<LinLinLin>::sample_detailed(
            0.5, &lower, &upper, &mut rng, None, &mut sample, &tol,
        );
        let correlated = UnitBaseCorrelated::<LinLinLin>::sample_detailed(
            0.5, &lower, &upper, &mut rng, Some(0.25), &mut sample, &tol,
        );

        assert_relative_eq!(s.value, 0.4526650429449553, max_relative = 1e-12);
        assert_relative_eq!(correlated.value, 0.5625, max_relative = 1e-12);
    }

    #[test]
    fn sample_in_subrange() {
        let tol = Tolerances::default();
        let (d0, d1) = skewed_bins();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };
        let mut sample = |d: &dyn TabularUnivariateDistribution<f64>, max: f64| {
            d.sample_with_random_number_in_subrange(0.5, max)
        };

        type G = CumulativePoints<LinLinLin>;

        // Bounded by the carried interior point: the lower bin is sampled
        // below its interior point.
        let mut rng = FakeStream::new(vec![0.75]);
        let y = G::sample_in_subrange(0.5, &lower, &upper, &mut rng, carried_point(), &mut sample, &tol);
        assert_relative_eq!(y, 0.5 * carried_point(), max_relative = 1e-12);

        // Bounds beyond the intermediate grid leave the bin untruncated.
        let mut rng = FakeStream::new(vec![0.25]);
        let y = G::sample_in_subrange(0.5, &lower, &upper, &mut rng, 10.0, &mut sample, &tol);
        assert_relative_eq!(y, 0.75 * 2f64.sqrt(), max_relative = 1e-12);

        // At a bin boundary only that bin is sampled.
        let mut rng = FakeStream::new(vec![0.5]);
        let y = G::sample_in_subrange(0.0, &lower, &upper, &mut rng, 0.5, &mut sample, &tol);
        assert_relative_eq!(y, 0.25, max_relative = 1e-12);
    }

    #[test]
    fn evaluate() {
        let tol = Tolerances::default();
        let d0 = UniformDistribution::new(0.0, 1.0, 1.0).unwrap();
        let d1 = UniformDistribution::new(1.0, 4.0, 1.0).unwrap();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };

        type G = CumulativePoints<LinLinLin>;
        assert_relative_eq!(
            G::evaluate_pdf(0.5, 1.5, &lower, &upper, Evaluation::Pdf, &tol),
            0.5,
            max_relative = 1e-12
        );
        assert_relative_eq!(G::evaluate_cdf(0.5, 1.5, &lower, &upper, &tol), 0.5, max_relative = 1e-12);
        assert_eq!(G::evaluate_pdf(0.5, 0.4, &lower, &upper, Evaluation::Pdf, &tol), 0.0);
        assert_eq!(G::evaluate_cdf(0.5, 0.5, &lower, &upper, &tol), 0.0);
        assert_eq!(G::evaluate_cdf(0.5, 2.5, &lower, &upper, &tol), 1.0);
    }

    #[test]
    fn evaluate_mixture() {
        let tol = Tolerances::default();
        let (d0, d1) = skewed_bins();
        let lower = Bin { primary: 0.0, secondary: &d0 };
        let upper = Bin { primary: 1.0, secondary: &d1 };

        // At y = 0.25 the flat bin is mapped with slope 0.5 / carried_point()
        // and the linear bin with slope 4 / 3.
        type G = CumulativePoints<LinLinLin>;
        let pdf = G::evaluate_pdf(0.5, 0.25, &lower, &upper, Evaluation::Pdf, &tol);
        assert_relative_eq!(pdf, 0.25 / carried_point() + 1.0 / 9.0, max_relative = 1e-12);

        let cdf = G::evaluate_cdf(0.5, 0.25, &lower, &upper, &tol);
        assert_relative_eq!(cdf, 0.5 * (0.125 / carried_point() + 1.0 / 36.0), max_relative = 1e-12);

        let cdf = G::evaluate_cdf(0.5, carried_point(), &lower, &upper, &tol);
        let upper_cdf = (carried_point() * 4.0 / 3.0).powi(2) / 4.0;
        assert_relative_eq!(cdf, 0.5 * (0.5 + upper_cdf), max_relative = 1e-12);
    }
}
