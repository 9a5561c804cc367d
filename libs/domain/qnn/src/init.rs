use rand::{distributions::Distribution, rngs::StdRng, SeedableRng};

use crate::Error;

// -----------------------------------------------------------------------------
// Init
// -----------------------------------------------------------------------------
/// Source of initial values for parameters.
///
/// Any closure `FnMut() -> f64` can be used as a source.
pub trait Init {
    fn sample(&mut self) -> f64;
}

impl<F> Init for F
where
    F: FnMut() -> f64,
{
    #[inline]
    fn sample(&mut self) -> f64 {
        self()
    }
}

// -----------------------------------------------------------------------------
// Uniform
// -----------------------------------------------------------------------------
/// Uniform distribution on `[low, high)`.
#[derive(Debug, Clone)]
pub struct Uniform {
    rng: StdRng,
    dist: rand::distributions::Uniform<f64>,
}

//
// ctor
//
impl Default for Uniform {
    /// Uniform distribution on `[-1, 1)` seeded from the OS.
    #[inline]
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            dist: rand::distributions::Uniform::new(-1.0, 1.0),
        }
    }
}

impl Uniform {
    #[inline]
    pub fn new(low: f64, high: f64) -> Result<Self, Error> {
        Self::_with_rng(low, high, StdRng::from_entropy())
    }

    /// Reproducible source for a given seed.
    #[inline]
    pub fn seeded(low: f64, high: f64, seed: u64) -> Result<Self, Error> {
        Self::_with_rng(low, high, StdRng::seed_from_u64(seed))
    }

    fn _with_rng(low: f64, high: f64, rng: StdRng) -> Result<Self, Error> {
        // `Uniform::new` panics on an empty or non-finite range
        let valid = low.is_finite() && high.is_finite() && low < high;
        if !valid {
            return Err(Error::InitRange { low, high });
        }
        Ok(Self {
            rng,
            dist: rand::distributions::Uniform::new(low, high),
        })
    }
}

impl Init for Uniform {
    #[inline]
    fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_closure() {
        let mut next = 0.0;
        let mut init = || {
            next += 0.5;
            next
        };

        assert_eq!(init.sample(), 0.5);
        assert_eq!(init.sample(), 1.0);
    }

    #[test]
    fn test_default_range() {
        let mut init = Uniform::default();

        for _ in 0..1000 {
            let v = init.sample();
            assert!((-1.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut lhs = Uniform::seeded(-0.5, 2.0, 42).unwrap();
        let mut rhs = Uniform::seeded(-0.5, 2.0, 42).unwrap();

        for _ in 0..100 {
            let v = lhs.sample();
            assert_eq!(v, rhs.sample());
            assert!((-0.5..2.0).contains(&v));
        }
    }

    #[rstest]
    #[case(1.0, 1.0)]
    #[case(1.0, -1.0)]
    #[case(f64::NAN, 1.0)]
    #[case(0.0, f64::INFINITY)]
    fn test_new_err_range(#[case] low: f64, #[case] high: f64) {
        let res = Uniform::new(low, high);

        assert!(matches!(res, Err(Error::InitRange { .. })));
    }
}
