//! Activation functions.
//!
//! A dense layer computes a pre-activation value `z = x W + b` and then applies an
//! activation function element-wise: `y = activation(z)`.
//!
//! The forward pass caches the *post-activation* outputs `y`. During backprop we
//! compute `dL/dz` from `dL/dy` using `y`, so no separate `z` buffer is kept.

use ndarray::{Array2, Zip};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Element-wise activation function.
pub enum Activation {
    /// `max(z, 0)`, used by both hidden layers.
    ReLU,
    /// No activation, used by the output projection.
    Identity,
}

impl Activation {
    #[inline]
    pub(crate) fn forward(self, x: f32) -> f32 {
        match self {
            Activation::ReLU => x.max(0.0),
            Activation::Identity => x,
        }
    }

    /// Derivative of the activation with respect to its input, expressed in terms
    /// of the cached post-activation output `y`.
    #[inline]
    pub(crate) fn grad_from_output(self, y: f32) -> f32 {
        match self {
            Activation::ReLU => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Identity => 1.0,
        }
    }

    /// Apply the activation in place.
    pub(crate) fn forward_inplace(self, z: &mut Array2<f32>) {
        if self != Activation::Identity {
            z.mapv_inplace(|v| self.forward(v));
        }
    }

    /// Turn `dL/dy` into `dL/dz` in place, given the cached outputs `y`.
    ///
    /// Shape contract: `d_outputs.dim() == outputs.dim()`.
    pub(crate) fn backward_inplace(self, outputs: &Array2<f32>, d_outputs: &mut Array2<f32>) {
        debug_assert_eq!(outputs.dim(), d_outputs.dim());
        if self == Activation::Identity {
            return;
        }
        Zip::from(d_outputs)
            .and(outputs)
            .for_each(|d, &y| *d *= self.grad_from_output(y));
    }
}
