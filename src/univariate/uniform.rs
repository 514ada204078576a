use super::{TabularUnivariateDistribution, UnivariateDistribution};
use crate::archive::TabularRecord;
use crate::error::ConstructionError;
use crate::num::Float;
use std::borrow::Cow;

/// Uniform distribution over `[lower, upper]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UniformDistribution<T: Float> {
    lower: T,
    upper: T,
    value: T,
}

impl<T: Float> UniformDistribution<T> {
    /// Creates a uniform distribution with the specified (unnormalized) value
    /// over its support.
    pub fn new(lower: T, upper: T, value: T) -> Result<Self, ConstructionError> {
        if !(lower < upper) || !lower.is_finite() || !upper.is_finite() {
            return Err(ConstructionError::BadUniformBounds);
        }
        if !(value >= T::ZERO) || !value.is_finite() {
            return Err(ConstructionError::BadTabularData(
                "values must be finite and non-negative",
            ));
        }

        Ok(Self {
            lower,
            upper,
            value,
        })
    }

    fn contains(&self, x: T) -> bool {
        x >= self.lower && x <= self.upper
    }
}

impl<T: Float> UnivariateDistribution<T> for UniformDistribution<T> {
    fn evaluate(&self, x: T) -> T {
        if self.contains(x) {
            self.value
        } else {
            T::ZERO
        }
    }

    fn evaluate_pdf(&self, x: T) -> T {
        if self.contains(x) {
            T::ONE / (self.upper - self.lower)
        } else {
            T::ZERO
        }
    }

    fn evaluate_cdf(&self, x: T) -> T {
        if !(x > self.lower) {
            T::ZERO
        } else if x >= self.upper {
            T::ONE
        } else {
            (x - self.lower) / (self.upper - self.lower)
        }
    }

    fn sample_with_random_number(&self, r: T) -> T {
        self.lower + r * (self.upper - self.lower)
    }

    fn sample_with_random_number_in_subrange(&self, r: T, max: T) -> T {
        let max = max.min(self.upper);

        self.lower + r * (max - self.lower)
    }

    fn lower_bound(&self) -> T {
        self.lower
    }

    fn upper_bound(&self) -> T {
        self.upper
    }
}

impl<T: Float> TabularUnivariateDistribution<T> for UniformDistribution<T> {
    fn sample_with_random_number_and_record_bin_index(&self, r: T, bin_index: &mut usize) -> T {
        *bin_index = 0;

        self.sample_with_random_number(r)
    }

    fn grid_points(&self) -> Cow<'_, [T]> {
        Cow::Owned(vec![self.lower, self.upper])
    }

    fn to_record(&self) -> TabularRecord {
        TabularRecord::Uniform {
            lower: self.lower.as_f64(),
            upper: self.upper.as_f64(),
            value: self.value.as_f64(),
        }
    }
}
