//! Optimizer.
//!
//! Plain (non-adaptive) gradient descent: every trainable parameter is updated as
//! `param -= lr * grad`. There is no optimizer state beyond the learning rate.

use crate::{Autoencoder, Error, Gradients, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Stochastic gradient descent with a fixed learning rate.
pub struct Sgd {
    lr: f32,
}

impl Sgd {
    #[inline]
    /// Construct an SGD optimizer.
    ///
    /// Returns an error if `lr` is not finite or `lr <= 0`.
    pub fn new(lr: f32) -> Result<Self> {
        if !(lr.is_finite() && lr > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {lr}"
            )));
        }
        Ok(Self { lr })
    }

    #[inline]
    /// Returns the learning rate.
    pub fn lr(&self) -> f32 {
        self.lr
    }

    #[inline]
    /// Apply one optimizer step: `param -= lr * d_param`.
    pub fn step(&self, model: &mut Autoencoder, grads: &Gradients) {
        model.sgd_step(grads, self.lr);
    }
}
