use super::{fuzzy_lower_bound, fuzzy_upper_bound, LinLin, OneDInterpolation};
use super::{LinLog, LinLogCos, LinNudgedLogCos, LogCosLin, LogCosLog, LogLin, LogLog};
use super::{LogLogCos, LogNudgedLogCos, NudgedLogCosLin, NudgedLogCosLog};
use crate::num::Float;

/// Two-dimensional interpolation policy.
///
/// The policy is named after the processing of the dependent variable `z`,
/// the secondary variable `y` and the primary variable `x`. It is described
/// by four one-dimensional policies:
///
/// * `ZY`: interpolation of `z` against `y` (processing of the secondary
///   variable),
/// * `ZX`: interpolation of `z` against `x`,
/// * `YX`: interpolation of secondary bounds against `x`,
/// * `LX`: interpolation of unit-base grid lengths against `x`.
pub trait TwoDInterpolation: 'static {
    /// Name of the policy.
    const NAME: &'static str;

    #[doc(hidden)]
    type ZY: OneDInterpolation;
    #[doc(hidden)]
    type ZX: OneDInterpolation;
    #[doc(hidden)]
    type YX: OneDInterpolation;
    #[doc(hidden)]
    type LX: OneDInterpolation;

    /// Interpolated secondary grid limit at `x`.
    #[inline]
    fn calculate_intermediate_grid_limit<T: Float>(x0: T, x1: T, x: T, y0: T, y1: T) -> T {
        Self::YX::interpolate(x0, x1, x, y0, y1)
    }

    /// Interpolated unit-base grid length at `x`.
    #[inline]
    fn calculate_intermediate_grid_length<T: Float>(x0: T, x1: T, x: T, l0: T, l1: T) -> T {
        Self::LX::interpolate(x0, x1, x, l0, l1)
    }

    /// Interpolates dependent values against `x`.
    ///
    /// Lin-lin interpolation is used when the two values do not share the same
    /// strict sign.
    #[inline]
    fn interpolate_dependent<T: Float>(x0: T, x1: T, x: T, z0: T, z1: T) -> T {
        if z0 * z1 > T::ZERO {
            Self::ZX::interpolate(x0, x1, x, z0, z1)
        } else {
            LinLin::interpolate(x0, x1, x, z0, z1)
        }
    }

    /// Unit-base interpolation of a dependent value at `(x, y)`.
    ///
    /// The secondary value is mapped onto each bin through its unit-base
    /// coordinate with respect to the intermediate grid `[y_min, y_max]`, the
    /// two bin evaluations are weighted by their grid lengths, interpolated
    /// against `x` and scaled back by the intermediate grid length. The
    /// `below` and `above` values are returned for secondary values outside
    /// the fuzzy intermediate grid.
    #[allow(clippy::too_many_arguments)]
    fn interpolate_unit_base<T, E0, E1>(
        (x0, x1, x): (T, T, T),
        y: T,
        (y_min, y_max): (T, T),
        (y0_min, y0_max): (T, T),
        (y1_min, y1_max): (T, T),
        evaluate_0: E0,
        evaluate_1: E1,
        (below, above): (T, T),
        tol: T,
    ) -> T
    where
        T: Float,
        E0: Fn(T) -> T,
        E1: Fn(T) -> T,
    {
        if y < fuzzy_lower_bound(y_min, tol) {
            return below;
        }
        if y > fuzzy_upper_bound(y_max, tol) {
            return above;
        }

        let l0 = Self::ZY::calculate_unit_base_grid_length(y0_min, y0_max);
        let l1 = Self::ZY::calculate_unit_base_grid_length(y1_min, y1_max);
        let l = Self::calculate_intermediate_grid_length(x0, x1, x, l0, l1);

        let eta = Self::ZY::calculate_unit_base_indep_var(y, y_min, l, tol);
        let y0 = Self::ZY::calculate_indep_var(eta, y0_min, l0, tol);
        let y1 = Self::ZY::calculate_indep_var(eta, y1_min, l1, tol);

        let z0 = evaluate_0(y0) * l0;
        let z1 = evaluate_1(y1) * l1;

        Self::interpolate_dependent(x0, x1, x, z0, z1) / l
    }
}

macro_rules! two_d_interpolation {
    ($(#[$meta:meta])* $name:ident: $zy:ty, $zx:ty, $yx:ty, $lx:ty) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name;

        impl TwoDInterpolation for $name {
            const NAME: &'static str = stringify!($name);
            type ZY = $zy;
            type ZX = $zx;
            type YX = $yx;
            type LX = $lx;
        }
    };
}

two_d_interpolation!(
    /// Lin-lin-lin interpolation.
    LinLinLin: LinLin, LinLin, LinLin, LinLin
);
two_d_interpolation!(
    /// Linear `z`, logarithmic `y`, linear `x`.
    LinLogLin: LinLog, LinLin, LogLin, LinLin
);
two_d_interpolation!(
    /// Linear `z`, linear `y`, logarithmic `x`.
    LinLinLog: LinLin, LinLog, LinLog, LinLog
);
two_d_interpolation!(
    /// Linear `z`, logarithmic `y`, logarithmic `x`.
    LinLogLog: LinLog, LinLog, LogLog, LinLog
);
two_d_interpolation!(
    /// Logarithmic `z`, linear `y`, linear `x`.
    LogLinLin: LogLin, LogLin, LinLin, LinLin
);
two_d_interpolation!(
    /// Logarithmic `z`, logarithmic `y`, linear `x`.
    LogLogLin: LogLog, LogLin, LogLin, LinLin
);
two_d_interpolation!(
    /// Logarithmic `z`, linear `y`, logarithmic `x`.
    LogLinLog: LogLin, LogLog, LinLog, LinLog
);
two_d_interpolation!(
    /// Log-log-log interpolation.
    LogLogLog: LogLog, LogLog, LogLog, LinLog
);
two_d_interpolation!(
    /// Linear `z`, logarithmic `1 - mu`, linear `x`.
    LinLogCosLin: LinLogCos, LinLin, LogCosLin, LinLin
);
two_d_interpolation!(
    /// Linear `z`, logarithmic `1 - mu`, logarithmic `x`.
    LinLogCosLog: LinLogCos, LinLog, LogCosLog, LinLog
);
two_d_interpolation!(
    /// Logarithmic `z`, logarithmic `1 - mu`, linear `x`.
    LogLogCosLin: LogLogCos, LogLin, LogCosLin, LinLin
);
two_d_interpolation!(
    /// Logarithmic `z`, logarithmic `1 - mu`, logarithmic `x`.
    LogLogCosLog: LogLogCos, LogLog, LogCosLog, LinLog
);
two_d_interpolation!(
    /// Linear `z`, logarithmic nudged `1 - mu`, linear `x`.
    LinNudgedLogCosLin: LinNudgedLogCos, LinLin, NudgedLogCosLin, LinLin
);
two_d_interpolation!(
    /// Linear `z`, logarithmic nudged `1 - mu`, logarithmic `x`.
    LinNudgedLogCosLog: LinNudgedLogCos, LinLog, NudgedLogCosLog, LinLog
);
two_d_interpolation!(
    /// Logarithmic `z`, logarithmic nudged `1 - mu`, linear `x`.
    LogNudgedLogCosLin: LogNudgedLogCos, LogLin, NudgedLogCosLin, LinLin
);
two_d_interpolation!(
    /// Logarithmic `z`, logarithmic nudged `1 - mu`, logarithmic `x`.
    LogNudgedLogCosLog: LogNudgedLogCos, LogLog, NudgedLogCosLog, LinLog
);
