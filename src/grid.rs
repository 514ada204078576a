//! Grid policies.
//!
//! A grid policy combines the secondary distributions of the two primary grid
//! points bracketing a primary value into the secondary conditional
//! distribution at that primary value. Policies are stateless: they are only
//! used as type parameters of the bivariate engines.

use crate::bivariate::{Tolerances, MAX_ITERATIONS};
use crate::interpolation::{fuzzy_lower_bound, fuzzy_upper_bound, OneDInterpolation, TwoDInterpolation};
use crate::num::Float;
use crate::random::random_number;
use crate::univariate::{TabularUnivariateDistribution, UnivariateDistribution};
use rand_core::RngCore;

pub use correlated::*;
pub use cumulative_points::*;
pub use direct::*;
pub use unit_base::*;
pub use unit_base_correlated::*;

mod correlated;
mod cumulative_points;
mod direct;
mod unit_base;
mod unit_base_correlated;

/// Sampling functor: draws a sample from a secondary distribution given a
/// uniform random number.
pub type SampleFn<'a, T> = dyn FnMut(&dyn TabularUnivariateDistribution<T>, T) -> T + 'a;

/// Subrange sampling functor: draws a sample from a secondary distribution
/// no greater than the specified maximum.
pub type SubrangeSampleFn<'a, T> = dyn FnMut(&dyn TabularUnivariateDistribution<T>, T) -> T + 'a;

/// A primary grid point and its secondary distribution.
#[derive(Copy, Clone, Debug)]
pub struct Bin<'a, T: Float> {
    pub primary: T,
    pub secondary: &'a dyn TabularUnivariateDistribution<T>,
}

impl<'a, T: Float> Bin<'a, T> {
    /// Lower bound of the secondary distribution.
    #[inline]
    pub fn lower_bound(&self) -> T {
        self.secondary.lower_bound()
    }

    /// Upper bound of the secondary distribution.
    #[inline]
    pub fn upper_bound(&self) -> T {
        self.secondary.upper_bound()
    }
}

/// Side of a primary bin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinSide {
    Lower,
    Upper,
}

impl BinSide {
    /// Selects the item on this side.
    #[inline]
    pub fn select<U>(self, lower: U, upper: U) -> U {
        match self {
            BinSide::Lower => lower,
            BinSide::Upper => upper,
        }
    }
}

/// Evaluation method applied to the secondary distributions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Evaluation {
    /// Distribution value.
    Value,
    /// Probability density.
    Pdf,
    /// Cumulative distribution.
    Cdf,
}

impl Evaluation {
    /// Applies the evaluation method to a secondary distribution.
    #[inline]
    pub fn apply<T: Float>(self, dist: &dyn TabularUnivariateDistribution<T>, y: T) -> T {
        match self {
            Evaluation::Value => dist.evaluate(y),
            Evaluation::Pdf => dist.evaluate_pdf(y),
            Evaluation::Cdf => dist.evaluate_cdf(y),
        }
    }
}

/// Detailed result of a secondary conditional sampling.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sample<T> {
    /// Sampled secondary value.
    pub value: T,
    /// Sample drawn from the secondary distribution of the sampled bin side,
    /// before any rescaling.
    pub raw: T,
    /// Sampled bin side.
    pub side: BinSide,
}

impl<T: Float> Sample<T> {
    pub(crate) fn unscaled(value: T, side: BinSide) -> Self {
        Self {
            value,
            raw: value,
            side,
        }
    }
}

/// Strategy combining the secondary distributions of a primary bin.
///
/// All operations take the primary value `x` and the `lower` and `upper`
/// bins bracketing it, with `lower.primary <= x <= upper.primary`.
///
/// The `*_cos` operations are used by the elastic engine, where the
/// secondary variable is a scattering cosine with fixed limits. By default
/// they are forwarded to the `CosGrid` policy.
pub trait GridPolicy: 'static {
    /// Name of the policy.
    const NAME: &'static str;

    /// Two-dimensional interpolation scheme.
    type Interp: TwoDInterpolation;

    /// Policy used for angular cosine secondary variables.
    type CosGrid: GridPolicy<Interp = Self::Interp>;

    /// Lower bound of the secondary conditional distribution at `x`.
    fn calculate_lower_bound<T: Float>(x: T, lower: &Bin<T>, upper: &Bin<T>) -> T;

    /// Upper bound of the secondary conditional distribution at `x`.
    fn calculate_upper_bound<T: Float>(x: T, lower: &Bin<T>, upper: &Bin<T>) -> T;

    /// Evaluates the secondary conditional value or density at `(x, y)`.
    fn evaluate_pdf<T: Float>(
        x: T,
        y: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        method: Evaluation,
        tol: &Tolerances,
    ) -> T;

    /// Evaluates the secondary conditional CDF at `(x, y)`.
    fn evaluate_cdf<T: Float>(x: T, y: T, lower: &Bin<T>, upper: &Bin<T>, tol: &Tolerances) -> T;

    /// Samples the secondary conditional distribution at `x`.
    ///
    /// The sampling functor is called with the random number `random_number`
    /// if specified, or with a number drawn from `rng` otherwise. The bin side
    /// selection, if any, draws from `rng`.
    fn sample_detailed<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        rng: &mut dyn RngCore,
        random_number: Option<T>,
        sample: &mut SampleFn<'_, T>,
        tol: &Tolerances,
    ) -> Sample<T>;

    /// Samples the secondary conditional distribution at `x` in the subrange
    /// bounded by `max`.
    ///
    /// The sampling functor is called with the maximum value applicable to
    /// each sampled secondary distribution.
    fn sample_in_subrange<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        rng: &mut dyn RngCore,
        max: T,
        sample: &mut SubrangeSampleFn<'_, T>,
        tol: &Tolerances,
    ) -> T;

    /// Evaluates a secondary conditional value or density of a cosine
    /// variable within `limits`.
    fn evaluate_pdf_cos<T: Float>(
        x: T,
        y: T,
        limits: (T, T),
        lower: &Bin<T>,
        upper: &Bin<T>,
        method: Evaluation,
        tol: &Tolerances,
    ) -> T {
        Self::CosGrid::evaluate_pdf_cos(x, y, limits, lower, upper, method, tol)
    }

    /// Evaluates the secondary conditional CDF of a cosine variable within
    /// `limits`.
    fn evaluate_cdf_cos<T: Float>(
        x: T,
        y: T,
        limits: (T, T),
        lower: &Bin<T>,
        upper: &Bin<T>,
        tol: &Tolerances,
    ) -> T {
        Self::CosGrid::evaluate_cdf_cos(x, y, limits, lower, upper, tol)
    }

    /// Samples the secondary conditional distribution of a cosine variable.
    fn sample_cos_detailed<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        rng: &mut dyn RngCore,
        random_number: Option<T>,
        sample: &mut SampleFn<'_, T>,
        tol: &Tolerances,
    ) -> Sample<T> {
        Self::CosGrid::sample_cos_detailed(x, lower, upper, rng, random_number, sample, tol)
    }

    /// Samples the secondary conditional distribution of a cosine variable in
    /// the subrange bounded by `max`.
    fn sample_cos_in_subrange<T: Float>(
        x: T,
        lower: &Bin<T>,
        upper: &Bin<T>,
        rng: &mut dyn RngCore,
        max: T,
        sample: &mut SubrangeSampleFn<'_, T>,
        tol: &Tolerances,
    ) -> T {
        Self::CosGrid::sample_cos_in_subrange(x, lower, upper, rng, max, sample, tol)
    }

    /// Checks whether a secondary distribution can be used with this policy.
    fn is_compatible_secondary<T: Float>(dist: &dyn TabularUnivariateDistribution<T>) -> bool {
        dist.is_compatible_with_interp_type(
            <<Self::Interp as TwoDInterpolation>::ZY as OneDInterpolation>::INDEP,
        )
    }
}

// Fractional position of `x` within the bin in processed primary space.
#[inline]
fn primary_fraction<I: TwoDInterpolation, T: Float>(x: T, lower: &Bin<T>, upper: &Bin<T>) -> T {
    if x <= lower.primary {
        T::ZERO
    } else if x >= upper.primary {
        T::ONE
    } else {
        I::ZX::fraction(lower.primary, upper.primary, x)
    }
}

// Draws the bin side, the upper side being selected with a probability
// equal to the fractional position of `x`.
#[inline]
fn choose_bin_side<I: TwoDInterpolation, T: Float>(
    x: T,
    lower: &Bin<T>,
    upper: &Bin<T>,
    rng: &mut dyn RngCore,
) -> BinSide {
    let beta = primary_fraction::<I, T>(x, lower, upper);

    if random_number::<T>(rng) < beta {
        BinSide::Upper
    } else {
        BinSide::Lower
    }
}

// Returns the supplied random number or draws a new one.
#[inline]
fn resolve_random_number<T: Float>(rng: &mut dyn RngCore, r: Option<T>) -> T {
    match r {
        Some(r) => r,
        None => random_number(rng),
    }
}

// Intermediate secondary grid limits, exact at the bin boundaries.
#[inline]
fn intermediate_limits<I: TwoDInterpolation, T: Float>(
    x: T,
    lower: &Bin<T>,
    upper: &Bin<T>,
) -> (T, T) {
    if x == lower.primary {
        (lower.lower_bound(), lower.upper_bound())
    } else if x == upper.primary {
        (upper.lower_bound(), upper.upper_bound())
    } else {
        let (x0, x1) = (lower.primary, upper.primary);
        (
            I::calculate_intermediate_grid_limit(x0, x1, x, lower.lower_bound(), upper.lower_bound()),
            I::calculate_intermediate_grid_limit(x0, x1, x, lower.upper_bound(), upper.upper_bound()),
        )
    }
}

// Unit-base grid length of a bin's secondary distribution.
#[inline]
fn grid_length<I: TwoDInterpolation, T: Float>(bin: &Bin<T>) -> T {
    I::ZY::calculate_unit_base_grid_length(bin.lower_bound(), bin.upper_bound())
}

// Evaluates a bin on its own support, snapping values within the fuzzy
// boundaries onto the support.
fn evaluate_bin_snapped<T: Float>(
    bin: &Bin<T>,
    y: T,
    method: Evaluation,
    (below, above): (T, T),
    tol: &Tolerances,
) -> T {
    let fuzz = T::cast_f64(tol.fuzzy_boundary);
    let (y_min, y_max) = (bin.lower_bound(), bin.upper_bound());

    if y < fuzzy_lower_bound(y_min, fuzz) {
        return below;
    }
    if y > fuzzy_upper_bound(y_max, fuzz) {
        return above;
    }

    method.apply(bin.secondary, y.max(y_min).min(y_max))
}

// Estimates the common CDF value `c` at which the interpolated secondary
// value `evaluate(c)` matches `target`, by bisection between the initial
// estimates `c_a` and `c_b`.
//
// The bracket is first widened by the `shrink` and `grow` factors until it
// contains the target.
fn estimate_cdf<T, F>(
    target: T,
    (c_a, c_b): (T, T),
    (shrink, grow): (f64, f64),
    evaluate: F,
    tol: &Tolerances,
) -> T
where
    T: Float,
    F: Fn(T) -> T,
{
    let mut lower_cdf = c_a.min(c_b).max(T::ZERO);
    let mut upper_cdf = c_a.max(c_b).min(T::ONE);

    let mut widening = 0;
    while evaluate(lower_cdf) > target {
        if lower_cdf == T::ZERO {
            break;
        }
        widening += 1;
        lower_cdf = if widening < MAX_ITERATIONS {
            lower_cdf * T::cast_f64(shrink)
        } else {
            T::ZERO
        };
    }

    if upper_cdf <= T::ZERO {
        upper_cdf = T::ONE;
    }
    let mut widening = 0;
    while evaluate(upper_cdf) < target {
        if upper_cdf == T::ONE {
            break;
        }
        widening += 1;
        upper_cdf = if widening < MAX_ITERATIONS {
            (upper_cdf * T::cast_f64(grow)).min(T::ONE)
        } else {
            T::ONE
        };
    }

    let (norm, tolerance) = if target == T::ZERO {
        (T::ONE, T::cast_f64(tol.error))
    } else {
        (target, T::cast_f64(tol.relative_error))
    };

    let mut estimate = (lower_cdf + upper_cdf) / T::TWO;
    for _ in 0..MAX_ITERATIONS {
        estimate = (lower_cdf + upper_cdf) / T::TWO;
        let value = evaluate(estimate);
        if value == target || ((target - value) / norm).abs() <= tolerance {
            return estimate;
        }
        if value < target {
            lower_cdf = estimate;
        } else {
            upper_cdf = estimate;
        }
    }

    log::warn!(
        "correlated CDF estimate did not converge after {} iterations (target {}, estimate {})",
        MAX_ITERATIONS,
        target,
        estimate
    );

    estimate
}

// Density of a correlated combination of two densities.
//
// With `y(c)` interpolated between `y0(c)` and `y1(c)` in a space with
// inverse derivative `jacobian`, `g_i` are the densities of the two bins in
// that space and the result is the density of `y(c)`.
#[inline]
fn correlated_density<T: Float>(beta: T, g0: T, g1: T, jacobian: T) -> T {
    let denominator = (T::ONE - beta) * g1 + beta * g0;
    if !(denominator > T::ZERO) || !(jacobian > T::ZERO) {
        return T::ZERO;
    }

    g0 * g1 / denominator / jacobian
}
