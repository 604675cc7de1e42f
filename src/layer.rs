//! Dense layers and parameter initialisation.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{Activation, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Parameter initialiser.
pub enum Init {
    /// `Normal(0, stddev)`; samples further than two standard deviations from
    /// the mean are discarded and redrawn.
    TruncatedNormal { stddev: f32 },
    /// All zeros.
    Zeros,
}

impl Init {
    /// Truncated normal scaled by fan-in: `stddev = 1 / sqrt(in_dim)`.
    #[inline]
    pub fn fan_in(in_dim: usize) -> Self {
        Init::TruncatedNormal {
            stddev: 1.0 / (in_dim as f32).sqrt(),
        }
    }

    /// Validate initialiser parameters.
    pub fn validate(self) -> Result<()> {
        match self {
            Init::TruncatedNormal { stddev } => {
                if !(stddev.is_finite() && stddev > 0.0) {
                    return Err(Error::InvalidConfig(format!(
                        "truncated normal stddev must be finite and > 0, got {stddev}"
                    )));
                }
                Ok(())
            }
            Init::Zeros => Ok(()),
        }
    }

    /// Sample a `(rows, cols)` matrix.
    pub fn matrix<R: Rng + ?Sized>(
        self,
        rows: usize,
        cols: usize,
        rng: &mut R,
    ) -> Result<Array2<f32>> {
        let values = self.sample(rows * cols, rng)?;
        Array2::from_shape_vec((rows, cols), values)
            .map_err(|e| Error::InvalidShape(format!("failed to shape init matrix: {e}")))
    }

    /// Sample a vector of length `len`.
    pub fn vector<R: Rng + ?Sized>(self, len: usize, rng: &mut R) -> Result<Array1<f32>> {
        Ok(Array1::from_vec(self.sample(len, rng)?))
    }

    fn sample<R: Rng + ?Sized>(self, n: usize, rng: &mut R) -> Result<Vec<f32>> {
        self.validate()?;

        match self {
            Init::Zeros => Ok(vec![0.0; n]),
            Init::TruncatedNormal { stddev } => {
                let normal = Normal::new(0.0_f32, stddev).map_err(|e| {
                    Error::InvalidConfig(format!("invalid normal stddev {stddev}: {e}"))
                })?;
                let bound = 2.0 * stddev;

                let mut out = Vec::with_capacity(n);
                while out.len() < n {
                    let v = normal.sample(rng);
                    if v.abs() <= bound {
                        out.push(v);
                    }
                }
                Ok(out)
            }
        }
    }
}

/// A fully connected layer: `y = activation(x W + b)`.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Shape `(in_dim, out_dim)`.
    weights: Array2<f32>,
    /// Shape `(out_dim,)`.
    biases: Array1<f32>,
    activation: Activation,
}

/// Gradients of the loss with respect to one layer's parameters.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub(crate) d_weights: Array2<f32>,
    pub(crate) d_biases: Array1<f32>,
}

impl LayerGradients {
    #[inline]
    pub fn d_weights(&self) -> &Array2<f32> {
        &self.d_weights
    }

    #[inline]
    pub fn d_biases(&self) -> &Array1<f32> {
        &self.d_biases
    }
}

impl Layer {
    /// Create a layer with fan-in truncated normal weights and zero biases.
    pub fn new_with_rng<R: Rng + ?Sized>(
        in_dim: usize,
        out_dim: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }

        let weights = Init::fan_in(in_dim).matrix(in_dim, out_dim, rng)?;
        let biases = Init::Zeros.vector(out_dim, rng)?;
        Ok(Self {
            weights,
            biases,
            activation,
        })
    }

    /// Build a layer from explicit parameters.
    ///
    /// `weights` is `(in_dim, out_dim)` and `biases` is `(out_dim,)`. All values must be finite.
    pub fn from_parts(
        weights: Array2<f32>,
        biases: Array1<f32>,
        activation: Activation,
    ) -> Result<Self> {
        let (in_dim, out_dim) = weights.dim();
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }
        if biases.len() != out_dim {
            return Err(Error::shape_mismatch("biases", &[out_dim], biases.shape()));
        }
        if weights.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "weights must contain only finite values".to_owned(),
            ));
        }
        if biases.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "biases must contain only finite values".to_owned(),
            ));
        }

        Ok(Self {
            weights,
            biases,
            activation,
        })
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.weights.nrows()
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.weights.ncols()
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &Array1<f32> {
        &self.biases
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut Array2<f32> {
        &mut self.weights
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut Array1<f32> {
        &mut self.biases
    }

    /// Forward pass for a batch.
    ///
    /// Shape contract: `inputs.ncols() == self.in_dim()`; returns `(batch, out_dim)`.
    #[inline]
    pub(crate) fn forward(&self, inputs: ArrayView2<'_, f32>) -> Array2<f32> {
        debug_assert_eq!(inputs.ncols(), self.in_dim());

        let mut z = inputs.dot(&self.weights) + &self.biases;
        self.activation.forward_inplace(&mut z);
        z
    }

    /// Backward pass for a batch.
    ///
    /// Inputs:
    /// - `inputs`: the same inputs passed to `forward`
    /// - `outputs`: the outputs previously produced by `forward` (post-activation)
    /// - `d_outputs`: upstream gradient dL/d(outputs), consumed as scratch
    ///
    /// Returns the parameter gradients and dL/d(inputs).
    pub(crate) fn backward(
        &self,
        inputs: ArrayView2<'_, f32>,
        outputs: &Array2<f32>,
        d_outputs: Array2<f32>,
    ) -> (LayerGradients, Array2<f32>) {
        debug_assert_eq!(inputs.nrows(), outputs.nrows());
        debug_assert_eq!(outputs.dim(), d_outputs.dim());

        let mut d_z = d_outputs;
        self.activation.backward_inplace(outputs, &mut d_z);

        let d_weights = inputs.t().dot(&d_z);
        let d_biases = d_z.sum_axis(Axis(0));
        let d_inputs = d_z.dot(&self.weights.t());

        (
            LayerGradients {
                d_weights,
                d_biases,
            },
            d_inputs,
        )
    }

    /// `param -= lr * d_param` for weights and biases.
    #[inline]
    pub(crate) fn sgd_step(&mut self, grads: &LayerGradients, lr: f32) {
        debug_assert_eq!(self.weights.dim(), grads.d_weights.dim());
        debug_assert_eq!(self.biases.len(), grads.d_biases.len());

        self.weights.scaled_add(-lr, &grads.d_weights);
        self.biases.scaled_add(-lr, &grads.d_biases);
    }
}
