use super::{TabularUnivariateDistribution, UnivariateDistribution};
use crate::archive::TabularRecord;
use crate::error::ConstructionError;
use crate::interpolation::{LinLin, OneDInterpolation};
use crate::num::Float;
use crate::search::find_lower_bin_index;
use std::borrow::Cow;

/// Tabular distribution with lin-lin interpolation between tabulated points.
///
/// The cumulative distribution is the exact integral of the piecewise linear
/// density and sampling inverts it exactly within each bin.
#[derive(Clone, Debug)]
pub struct TabularDistribution<T: Float> {
    bin_boundaries: Vec<T>,
    values: Vec<T>,
    // Unnormalized cumulative values at the bin boundaries.
    cdf: Vec<T>,
    slopes: Vec<T>,
    norm: T,
}

impl<T: Float> TabularDistribution<T> {
    /// Creates a distribution from strictly increasing bin boundaries and
    /// the non-negative values of the distribution at these boundaries.
    pub fn new(bin_boundaries: Vec<T>, values: Vec<T>) -> Result<Self, ConstructionError> {
        let n = bin_boundaries.len();
        if n < 2 {
            return Err(ConstructionError::BadTabularData(
                "at least two bin boundaries are required",
            ));
        }
        if values.len() != n {
            return Err(ConstructionError::BadTabularData(
                "the number of values does not match the number of bin boundaries",
            ));
        }
        if bin_boundaries.iter().any(|x| !x.is_finite())
            || bin_boundaries.windows(2).any(|w| !(w[0] < w[1]))
        {
            return Err(ConstructionError::BadTabularData(
                "bin boundaries must be finite and strictly increasing",
            ));
        }
        if values.iter().any(|&y| !(y >= T::ZERO) || !y.is_finite()) {
            return Err(ConstructionError::BadTabularData(
                "values must be finite and non-negative",
            ));
        }

        let mut cdf = Vec::with_capacity(n);
        let mut slopes = Vec::with_capacity(n - 1);
        cdf.push(T::ZERO);
        for i in 0..n - 1 {
            let dx = bin_boundaries[i + 1] - bin_boundaries[i];
            let area = (values[i] + values[i + 1]) * dx / T::TWO;
            cdf.push(cdf[i] + area);
            slopes.push((values[i + 1] - values[i]) / dx);
        }

        let total = cdf[n - 1];
        if !(total > T::ZERO) || !total.is_finite() {
            return Err(ConstructionError::BadTabularData(
                "the distribution must have a positive finite area",
            ));
        }

        Ok(Self {
            bin_boundaries,
            values,
            cdf,
            slopes,
            norm: T::ONE / total,
        })
    }

    /// Tabulated bin boundaries.
    pub fn bin_boundaries(&self) -> &[T] {
        &self.bin_boundaries
    }

    /// Tabulated values.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    // Index of the bin containing `x`, which must be within the support.
    fn bin(&self, x: T) -> usize {
        find_lower_bin_index(&self.bin_boundaries, x).unwrap_or(0)
    }

    fn sample_impl(&self, r: T) -> (T, usize) {
        let n = self.cdf.len();
        let scaled = (r * self.cdf[n - 1]).max(T::ZERO).min(self.cdf[n - 1]);
        let i = find_lower_bin_index(&self.cdf, scaled).unwrap_or(0);

        let x0 = self.bin_boundaries[i];
        let y0 = self.values[i];
        let slope = self.slopes[i];
        let delta = scaled - self.cdf[i];

        let x = if slope != T::ZERO {
            let discriminant = (y0 * y0 + T::TWO * slope * delta).max(T::ZERO);
            x0 + (discriminant.sqrt() - y0) / slope
        } else if y0 > T::ZERO {
            x0 + delta / y0
        } else {
            x0
        };

        (x.max(x0).min(self.bin_boundaries[i + 1]), i)
    }
}

impl<T: Float> UnivariateDistribution<T> for TabularDistribution<T> {
    fn evaluate(&self, x: T) -> T {
        let n = self.bin_boundaries.len();
        if !(x >= self.bin_boundaries[0] && x <= self.bin_boundaries[n - 1]) {
            return T::ZERO;
        }
        if x == self.bin_boundaries[n - 1] {
            return self.values[n - 1];
        }

        let i = self.bin(x);
        LinLin::interpolate(
            self.bin_boundaries[i],
            self.bin_boundaries[i + 1],
            x,
            self.values[i],
            self.values[i + 1],
        )
    }

    fn evaluate_pdf(&self, x: T) -> T {
        self.evaluate(x) * self.norm
    }

    fn evaluate_cdf(&self, x: T) -> T {
        let n = self.bin_boundaries.len();
        if !(x > self.bin_boundaries[0]) {
            return T::ZERO;
        }
        if x >= self.bin_boundaries[n - 1] {
            return T::ONE;
        }

        let i = self.bin(x);
        let dx = x - self.bin_boundaries[i];
        let integral = self.cdf[i] + dx * self.values[i] + dx * dx * self.slopes[i] / T::TWO;

        (integral * self.norm).min(T::ONE)
    }

    fn sample_with_random_number(&self, r: T) -> T {
        self.sample_impl(r).0
    }

    fn sample_with_random_number_in_subrange(&self, r: T, max: T) -> T {
        self.sample_impl(r * self.evaluate_cdf(max)).0
    }

    fn lower_bound(&self) -> T {
        self.bin_boundaries[0]
    }

    fn upper_bound(&self) -> T {
        self.bin_boundaries[self.bin_boundaries.len() - 1]
    }
}

impl<T: Float> TabularUnivariateDistribution<T> for TabularDistribution<T> {
    fn sample_with_random_number_and_record_bin_index(&self, r: T, bin_index: &mut usize) -> T {
        let (x, i) = self.sample_impl(r);
        *bin_index = i;

        x
    }

    fn grid_points(&self) -> Cow<'_, [T]> {
        Cow::Borrowed(&self.bin_boundaries)
    }

    fn to_record(&self) -> TabularRecord {
        TabularRecord::Tabular {
            bin_boundaries: self.bin_boundaries.iter().map(|x| x.as_f64()).collect(),
            values: self.values.iter().map(|y| y.as_f64()).collect(),
        }
    }
}
