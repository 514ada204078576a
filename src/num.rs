use rand::{Rng, RngCore};
use std::fmt::{Debug, Display};

/// Floating point trait.
///
/// This is the only numeric parameter of the distributions: quantities of
/// every dimension (primary, secondary and dependent values) share the same
/// floating point type.
pub trait Float:
    num_traits::Float + Debug + Display + Default + Send + Sync + 'static
{
    #[doc(hidden)]
    const ZERO: Self;
    #[doc(hidden)]
    const ONE: Self;
    #[doc(hidden)]
    const TWO: Self;

    #[doc(hidden)]
    fn cast_f64(x: f64) -> Self;
    #[doc(hidden)]
    fn as_f64(self) -> f64;
    #[doc(hidden)]
    fn gen<R: RngCore + ?Sized>(rng: &mut R) -> Self;
}

impl Float for f32 {
    #[doc(hidden)]
    const ZERO: Self = 0f32;
    #[doc(hidden)]
    const ONE: Self = 1f32;
    #[doc(hidden)]
    const TWO: Self = 2f32;

    #[doc(hidden)]
    fn cast_f64(x: f64) -> Self {
        x as Self
    }
    #[doc(hidden)]
    fn as_f64(self) -> f64 {
        self as f64
    }
    #[doc(hidden)]
    fn gen<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        rng.gen()
    }
}

impl Float for f64 {
    #[doc(hidden)]
    const ZERO: Self = 0f64;
    #[doc(hidden)]
    const ONE: Self = 1f64;
    #[doc(hidden)]
    const TWO: Self = 2f64;

    #[doc(hidden)]
    fn cast_f64(x: f64) -> Self {
        x
    }
    #[doc(hidden)]
    fn as_f64(self) -> f64 {
        self
    }
    #[doc(hidden)]
    fn gen<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        rng.gen()
    }
}
