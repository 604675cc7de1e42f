//! Inverted dropout.
//!
//! In [`Mode::Train`] each unit is kept with probability `keep_prob` and scaled by
//! `1 / keep_prob`, otherwise zeroed, so the expected activation is unchanged.
//! In [`Mode::Eval`] dropout is the identity.

use ndarray::Array2;
use rand::Rng;

use crate::{Error, Result};

/// Default probability of keeping a unit.
pub const DEFAULT_KEEP_PROB: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Whether a forward pass samples dropout.
pub enum Mode {
    /// Sample a fresh dropout mask.
    Train,
    /// Deterministic; equivalent to `keep_prob = 1.0`.
    Eval,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dropout {
    keep_prob: f32,
}

impl Default for Dropout {
    fn default() -> Self {
        Self {
            keep_prob: DEFAULT_KEEP_PROB,
        }
    }
}

impl Dropout {
    /// Returns an error unless `keep_prob` is finite and in `(0, 1]`.
    pub fn new(keep_prob: f32) -> Result<Self> {
        if !(keep_prob.is_finite() && keep_prob > 0.0 && keep_prob <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "keep_prob must be finite and in (0, 1], got {keep_prob}"
            )));
        }
        Ok(Self { keep_prob })
    }

    #[inline]
    pub fn keep_prob(&self) -> f32 {
        self.keep_prob
    }

    /// Apply dropout to `activations` in place.
    ///
    /// Returns the per-unit scale that was applied (`0` or `1 / keep_prob`), or
    /// `None` if nothing was sampled (eval mode or `keep_prob == 1`). The backward
    /// pass multiplies upstream gradients by the same scale.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        activations: &mut Array2<f32>,
        mode: Mode,
        rng: &mut R,
    ) -> Option<Array2<f32>> {
        if mode == Mode::Eval || self.keep_prob >= 1.0 {
            return None;
        }

        let keep = f64::from(self.keep_prob);
        let kept_scale = 1.0 / self.keep_prob;
        let scale = Array2::from_shape_simple_fn(activations.raw_dim(), || {
            if rng.gen_bool(keep) { kept_scale } else { 0.0 }
        });
        *activations *= &scale;
        Some(scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn keep_prob_must_be_in_unit_interval() {
        assert!(Dropout::new(0.0).is_err());
        assert!(Dropout::new(1.5).is_err());
        assert!(Dropout::new(f32::NAN).is_err());
        assert!(Dropout::new(1.0).is_ok());
        assert_eq!(Dropout::default().keep_prob(), 0.8);
    }

    #[test]
    fn eval_mode_is_identity() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut x = Array2::from_elem((3, 4), 2.0_f32);
        let scale = Dropout::new(0.5).unwrap().apply(&mut x, Mode::Eval, &mut rng);
        assert!(scale.is_none());
        assert!(x.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn train_mode_zeroes_or_rescales() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut x = Array2::from_elem((32, 32), 1.0_f32);
        let scale = Dropout::new(0.5)
            .unwrap()
            .apply(&mut x, Mode::Train, &mut rng)
            .unwrap();

        assert!(x.iter().all(|&v| v == 0.0 || v == 2.0));
        assert_eq!(x, scale);

        let kept = x.iter().filter(|&&v| v > 0.0).count();
        // 1024 Bernoulli(0.5) draws; far outside this band would mean a broken sampler.
        assert!((312..=712).contains(&kept), "kept={kept}");
    }
}
