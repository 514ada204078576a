//! One-dimensional and two-dimensional interpolation policies.
//!
//! A one-dimensional policy is named after the processing of its dependent
//! variable followed by the processing of its independent variable, so that
//! `LinLog` interpolates linearly in `y` against `ln x`. Cosine variables are
//! processed as `ln(1 - mu)`, optionally nudged away from the singularity at
//! `mu = 1`.

use crate::num::Float;
use serde::{Deserialize, Serialize};

pub use two_d::*;

mod two_d;

// Offset applied to `1 - mu` by the nudged cosine processing.
const NUDGE: f64 = 1.0e-10;

/// Processing applied to a variable before interpolation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Processing {
    /// The variable is used as is.
    Lin,
    /// The logarithm of the variable is used.
    Log,
    /// The logarithm of one minus the variable (a cosine) is used.
    LogCos,
    /// The logarithm of one minus the variable (a cosine) plus a small nudge
    /// is used, which keeps `mu = 1` within the valid range.
    NudgedLogCos,
}

impl Processing {
    /// Short name of the processing.
    pub fn name(self) -> &'static str {
        match self {
            Processing::Lin => "Lin",
            Processing::Log => "Log",
            Processing::LogCos => "LogCos",
            Processing::NudgedLogCos => "NudgedLogCos",
        }
    }

    /// Processes a value.
    #[inline]
    pub fn process<T: Float>(self, x: T) -> T {
        match self {
            Processing::Lin => x,
            Processing::Log => x.ln(),
            Processing::LogCos => (T::ONE - x).ln(),
            Processing::NudgedLogCos => (T::ONE - x + T::cast_f64(NUDGE)).ln(),
        }
    }

    /// Recovers a value from its processed form.
    #[inline]
    pub fn recover<T: Float>(self, p: T) -> T {
        match self {
            Processing::Lin => p,
            Processing::Log => p.exp(),
            Processing::LogCos => T::ONE - p.exp(),
            Processing::NudgedLogCos => (T::cast_f64(NUDGE) - p.exp()) + T::ONE,
        }
    }

    /// Returns `process(x) - process(x0)`.
    #[inline]
    pub fn difference<T: Float>(self, x: T, x0: T) -> T {
        match self {
            Processing::Lin => x - x0,
            Processing::Log => (x / x0).ln(),
            Processing::LogCos => ((T::ONE - x) / (T::ONE - x0)).ln(),
            Processing::NudgedLogCos => {
                let nudge = T::cast_f64(NUDGE);
                ((T::ONE - x + nudge) / (T::ONE - x0 + nudge)).ln()
            }
        }
    }

    /// Returns the value `x` such that `difference(x, x0) == d`.
    #[inline]
    pub fn offset<T: Float>(self, x0: T, d: T) -> T {
        match self {
            Processing::Lin => x0 + d,
            Processing::Log => x0 * d.exp(),
            Processing::LogCos => T::ONE - (T::ONE - x0) * d.exp(),
            Processing::NudgedLogCos => {
                let nudge = T::cast_f64(NUDGE);
                (T::ONE + nudge) - (T::ONE - x0 + nudge) * d.exp()
            }
        }
    }

    /// Interpolates between two values given a fractional position `beta` in
    /// the processed space of the other variable.
    #[inline]
    pub fn interpolate_beta<T: Float>(self, beta: T, y0: T, y1: T) -> T {
        match self {
            Processing::Lin => lerp(beta, y0, y1),
            Processing::Log => y0 * (y1 / y0).powf(beta),
            Processing::LogCos => {
                let d0 = T::ONE - y0;
                let d1 = T::ONE - y1;
                T::ONE - d0 * (d1 / d0).powf(beta)
            }
            Processing::NudgedLogCos => {
                let nudge = T::cast_f64(NUDGE);
                let d0 = T::ONE - y0 + nudge;
                let d1 = T::ONE - y1 + nudge;
                (nudge - d0 * (d1 / d0).powf(beta)) + T::ONE
            }
        }
    }

    /// Checks whether a value can be processed.
    pub fn is_in_valid_range<T: Float>(self, x: T) -> bool {
        match self {
            Processing::Lin => x.is_finite(),
            Processing::Log => x > T::ZERO && x.is_finite(),
            Processing::LogCos => x >= -T::ONE && x < T::ONE,
            Processing::NudgedLogCos => x >= -T::ONE && x <= T::ONE,
        }
    }

    /// Magnitude of the inverse derivative of the processing at `x`.
    ///
    /// This is the factor relating a density in processed space to a density
    /// in the unprocessed variable.
    #[inline]
    pub fn inverse_derivative<T: Float>(self, x: T) -> T {
        match self {
            Processing::Lin => T::ONE,
            Processing::Log => x,
            Processing::LogCos => T::ONE - x,
            Processing::NudgedLogCos => T::ONE - x + T::cast_f64(NUDGE),
        }
    }

    /// Returns `-1` if the processing reverses the order of values, `1`
    /// otherwise.
    #[inline]
    fn orientation<T: Float>(self) -> T {
        match self {
            Processing::LogCos | Processing::NudgedLogCos => -T::ONE,
            _ => T::ONE,
        }
    }
}

// Linear interpolation kernel.
#[inline(always)]
fn lerp<T: Float>(beta: T, y0: T, y1: T) -> T {
    if cfg!(feature = "fma") {
        (y1 - y0).mul_add(beta, y0)
    } else {
        y0 + (y1 - y0) * beta
    }
}

/// Fuzzy lower bound: the value moved away from zero (if negative) or towards
/// zero (if positive) by a relative tolerance.
#[inline]
pub fn fuzzy_lower_bound<T: Float>(value: T, tol: T) -> T {
    if value < T::ZERO {
        value * (T::ONE + tol)
    } else {
        value * (T::ONE - tol)
    }
}

/// Fuzzy upper bound: the value moved away from zero (if positive) or towards
/// zero (if negative) by a relative tolerance.
#[inline]
pub fn fuzzy_upper_bound<T: Float>(value: T, tol: T) -> T {
    if value > T::ZERO {
        value * (T::ONE + tol)
    } else {
        value * (T::ONE - tol)
    }
}

/// One-dimensional interpolation policy.
///
/// Implementors only define the processing of each variable; all operations
/// are provided.
pub trait OneDInterpolation: 'static {
    /// Name of the policy.
    const NAME: &'static str;
    /// Processing of the independent variable.
    const INDEP: Processing;
    /// Processing of the dependent variable.
    const DEP: Processing;

    /// Processes an independent variable value.
    fn process_indep_var<T: Float>(x: T) -> T {
        Self::INDEP.process(x)
    }

    /// Recovers an independent variable value from its processed form.
    fn recover_processed_indep_var<T: Float>(p: T) -> T {
        Self::INDEP.recover(p)
    }

    /// Processes a dependent variable value.
    fn process_dep_var<T: Float>(y: T) -> T {
        Self::DEP.process(y)
    }

    /// Recovers a dependent variable value from its processed form.
    fn recover_processed_dep_var<T: Float>(p: T) -> T {
        Self::DEP.recover(p)
    }

    /// Checks whether an independent variable value can be processed.
    fn is_indep_var_in_valid_range<T: Float>(x: T) -> bool {
        Self::INDEP.is_in_valid_range(x)
    }

    /// Checks whether a dependent variable value can be processed.
    fn is_dep_var_in_valid_range<T: Float>(y: T) -> bool {
        Self::DEP.is_in_valid_range(y)
    }

    /// Fractional position of `x` within `[x0, x1]` in processed space.
    #[inline]
    fn fraction<T: Float>(x0: T, x1: T, x: T) -> T {
        Self::INDEP.difference(x, x0) / Self::INDEP.difference(x1, x0)
    }

    /// Interpolates between `(x0, y0)` and `(x1, y1)`.
    #[inline]
    fn interpolate<T: Float>(x0: T, x1: T, x: T, y0: T, y1: T) -> T {
        Self::DEP.interpolate_beta(Self::fraction(x0, x1, x), y0, y1)
    }

    /// Interpolates between `y0` and `y1` given the fractional position
    /// `beta` in processed independent variable space.
    #[inline]
    fn interpolate_beta<T: Float>(beta: T, y0: T, y1: T) -> T {
        Self::DEP.interpolate_beta(beta, y0, y1)
    }

    /// Interpolates from processed quantities, given the slope of the
    /// processed dependent variable with respect to the processed independent
    /// variable.
    #[inline]
    fn interpolate_processed<T: Float>(
        processed_x0: T,
        processed_x: T,
        processed_y0: T,
        processed_slope: T,
    ) -> T {
        Self::DEP.recover(processed_y0 + processed_slope * (processed_x - processed_x0))
    }

    /// Length of a unit-base grid spanning `[lower, upper]`.
    #[inline]
    fn calculate_unit_base_grid_length<T: Float>(lower: T, upper: T) -> T {
        Self::INDEP.orientation::<T>() * Self::INDEP.difference(upper, lower)
    }

    /// Unit-base (normalized) coordinate of `y` on a grid starting at `y_min`.
    ///
    /// Coordinates slightly outside `[0, 1]` (within `tol`) are snapped onto
    /// the nearest boundary.
    #[inline]
    fn calculate_unit_base_indep_var<T: Float>(y: T, y_min: T, grid_length: T, tol: T) -> T {
        let eta = Self::INDEP.orientation::<T>() * Self::INDEP.difference(y, y_min) / grid_length;

        if eta > T::ONE && eta <= T::ONE + tol {
            T::ONE
        } else if eta < T::ZERO && eta >= -tol {
            T::ZERO
        } else {
            eta
        }
    }

    /// Value corresponding to the unit-base coordinate `eta` on a grid
    /// starting at `y_min`.
    #[inline]
    fn calculate_indep_var<T: Float>(eta: T, y_min: T, grid_length: T, tol: T) -> T {
        let y = Self::INDEP.offset(y_min, Self::INDEP.orientation::<T>() * grid_length * eta);

        if y < y_min && y >= fuzzy_lower_bound(y_min, tol) {
            y_min
        } else {
            y
        }
    }

    /// See [`fuzzy_lower_bound`].
    #[inline]
    fn calculate_fuzzy_lower_bound<T: Float>(value: T, tol: T) -> T {
        fuzzy_lower_bound(value, tol)
    }

    /// See [`fuzzy_upper_bound`].
    #[inline]
    fn calculate_fuzzy_upper_bound<T: Float>(value: T, tol: T) -> T {
        fuzzy_upper_bound(value, tol)
    }
}

macro_rules! one_d_interpolation {
    ($(#[$meta:meta])* $name:ident: $dep:ident, $indep:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name;

        impl OneDInterpolation for $name {
            const NAME: &'static str = stringify!($name);
            const INDEP: Processing = Processing::$indep;
            const DEP: Processing = Processing::$dep;
        }
    };
}

one_d_interpolation!(
    /// Linear in `y`, linear in `x`.
    LinLin: Lin, Lin
);
one_d_interpolation!(
    /// Linear in `y`, logarithmic in `x`.
    LinLog: Lin, Log
);
one_d_interpolation!(
    /// Logarithmic in `y`, linear in `x`.
    LogLin: Log, Lin
);
one_d_interpolation!(
    /// Logarithmic in `y`, logarithmic in `x`.
    LogLog: Log, Log
);
one_d_interpolation!(
    /// Linear in `y`, logarithmic in `1 - mu`.
    LinLogCos: Lin, LogCos
);
one_d_interpolation!(
    /// Linear in `y`, logarithmic in the nudged `1 - mu`.
    LinNudgedLogCos: Lin, NudgedLogCos
);
one_d_interpolation!(
    /// Logarithmic in `y`, logarithmic in `1 - mu`.
    LogLogCos: Log, LogCos
);
one_d_interpolation!(
    /// Logarithmic in `y`, logarithmic in the nudged `1 - mu`.
    LogNudgedLogCos: Log, NudgedLogCos
);
one_d_interpolation!(
    /// Logarithmic in `1 - mu`, linear in `x`.
    LogCosLin: LogCos, Lin
);
one_d_interpolation!(
    /// Logarithmic in `1 - mu`, logarithmic in `x`.
    LogCosLog: LogCos, Log
);
one_d_interpolation!(
    /// Logarithmic in the nudged `1 - mu`, linear in `x`.
    NudgedLogCosLin: NudgedLogCos, Lin
);
one_d_interpolation!(
    /// Logarithmic in the nudged `1 - mu`, logarithmic in `x`.
    NudgedLogCosLog: NudgedLogCos, Log
);
