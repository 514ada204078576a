//! Sources of random numbers.
//!
//! All sampling methods take the random number generator as an argument.
//! Besides regular generators, [`FakeStream`] replays a fixed sequence of
//! uniform variates, which makes every sampling decision reproducible.

use crate::num::Float;
use rand_core::{impls, Error, RngCore};

// 2^53, the resolution of the uniform `f64` conversion.
const SCALE: f64 = 9007199254740992.0;

/// Draws a uniform random number in `[0, 1)`.
#[inline]
pub fn random_number<T: Float>(rng: &mut dyn RngCore) -> T {
    T::gen(rng)
}

/// A generator replaying a fixed sequence of uniform variates.
///
/// Each number `r` of the stream is encoded so that the standard uniform
/// conversion of `rand` (`rng.gen::<f64>()`) returns `r`, rounded down to the
/// nearest multiple of 2⁻⁵³. Single precision draws see the same value
/// truncated to 24 bits. The stream restarts from the beginning once
/// exhausted.
#[derive(Clone, Debug)]
pub struct FakeStream {
    stream: Vec<f64>,
    position: usize,
}

impl FakeStream {
    /// Creates a stream from uniform variates in `[0, 1)`.
    ///
    /// # Panics
    ///
    /// Panics if the stream is empty or if a value is not within `[0, 1)`.
    pub fn new(stream: Vec<f64>) -> Self {
        assert!(!stream.is_empty(), "the fake stream must not be empty");
        assert!(
            stream.iter().all(|&r| r >= 0.0 && r < 1.0),
            "fake stream values must be in [0, 1)"
        );

        Self {
            stream,
            position: 0,
        }
    }

    /// Number of variates consumed since the creation of the stream, modulo
    /// the stream length.
    pub fn position(&self) -> usize {
        self.position
    }

    fn next_variate(&mut self) -> f64 {
        let r = self.stream[self.position];
        self.position = (self.position + 1) % self.stream.len();

        r
    }
}

impl RngCore for FakeStream {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let r = self.next_variate();

        ((r * SCALE) as u64) << 11
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
