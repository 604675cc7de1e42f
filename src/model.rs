use ndarray::Array2;
use rand::Rng;

use crate::{AutoencoderConfig, Dropout, Error, Layer, LayerGradients, Mode, Result};

/// Bottleneck autoencoder: `embedding_dim -> hidden1 -> hidden2 -> embedding_dim`.
///
/// Both hidden layers use ReLU; dropout is applied to the second hidden layer's
/// activations; the output projection is linear and its outputs are the logits.
#[derive(Debug, Clone)]
pub struct Autoencoder {
    hidden1: Layer,
    hidden2: Layer,
    output: Layer,
    dropout: Dropout,
}

/// Activations cached by a forward pass, reused by [`Autoencoder::backward`].
#[derive(Debug, Clone)]
pub struct ForwardPass {
    hidden1: Array2<f32>,
    /// Second hidden layer after dropout.
    hidden2: Array2<f32>,
    /// Scale applied by dropout, if any was sampled.
    dropout_scale: Option<Array2<f32>>,
    logits: Array2<f32>,
}

impl ForwardPass {
    #[inline]
    pub fn logits(&self) -> &Array2<f32> {
        &self.logits
    }

    #[inline]
    pub fn into_logits(self) -> Array2<f32> {
        self.logits
    }

    #[inline]
    pub fn hidden1(&self) -> &Array2<f32> {
        &self.hidden1
    }

    #[inline]
    pub fn hidden2(&self) -> &Array2<f32> {
        &self.hidden2
    }
}

/// Parameter gradients for an `Autoencoder`.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub hidden1: LayerGradients,
    pub hidden2: LayerGradients,
    pub output: LayerGradients,
    d_inputs: Array2<f32>,
}

impl Gradients {
    /// Gradients of one layer by scope name.
    pub fn layer(&self, name: &str) -> Option<&LayerGradients> {
        match name {
            "hidden1" => Some(&self.hidden1),
            "hidden2" => Some(&self.hidden2),
            "output" => Some(&self.output),
            _ => None,
        }
    }

    /// dL/d(inputs).
    #[inline]
    pub fn d_inputs(&self) -> &Array2<f32> {
        &self.d_inputs
    }
}

impl Autoencoder {
    /// Assemble a model from explicit layers.
    ///
    /// Layer widths must chain (`hidden1.out == hidden2.in`, `hidden2.out == output.in`)
    /// and the output width must equal the input width.
    pub fn from_layers(
        hidden1: Layer,
        hidden2: Layer,
        output: Layer,
        dropout: Dropout,
    ) -> Result<Self> {
        if hidden2.in_dim() != hidden1.out_dim() {
            return Err(Error::InvalidConfig(format!(
                "hidden2 in_dim {} does not match hidden1 out_dim {}",
                hidden2.in_dim(),
                hidden1.out_dim()
            )));
        }
        if output.in_dim() != hidden2.out_dim() {
            return Err(Error::InvalidConfig(format!(
                "output in_dim {} does not match hidden2 out_dim {}",
                output.in_dim(),
                hidden2.out_dim()
            )));
        }
        if output.out_dim() != hidden1.in_dim() {
            return Err(Error::InvalidConfig(format!(
                "output out_dim {} does not match embedding_dim {}",
                output.out_dim(),
                hidden1.in_dim()
            )));
        }

        Ok(Self {
            hidden1,
            hidden2,
            output,
            dropout,
        })
    }

    #[inline]
    pub fn embedding_dim(&self) -> usize {
        self.hidden1.in_dim()
    }

    #[inline]
    pub fn hidden1_units(&self) -> usize {
        self.hidden1.out_dim()
    }

    #[inline]
    pub fn hidden2_units(&self) -> usize {
        self.hidden2.out_dim()
    }

    #[inline]
    pub fn keep_prob(&self) -> f32 {
        self.dropout.keep_prob()
    }

    /// The shape and dropout rate this model was built with.
    pub fn config(&self) -> AutoencoderConfig {
        AutoencoderConfig {
            embedding_dim: self.embedding_dim(),
            hidden1_units: self.hidden1_units(),
            hidden2_units: self.hidden2_units(),
            keep_prob: self.keep_prob(),
        }
    }

    /// Layers in forward order, with their scope names.
    pub fn layers(&self) -> [(&'static str, &Layer); 3] {
        [
            ("hidden1", &self.hidden1),
            ("hidden2", &self.hidden2),
            ("output", &self.output),
        ]
    }

    /// Mutable access to a layer by scope name.
    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        match name {
            "hidden1" => Some(&mut self.hidden1),
            "hidden2" => Some(&mut self.hidden2),
            "output" => Some(&mut self.output),
            _ => None,
        }
    }

    /// Total number of trainable scalars.
    pub fn num_parameters(&self) -> usize {
        self.layers()
            .iter()
            .map(|(_, l)| l.weights().len() + l.biases().len())
            .sum()
    }

    /// Forward pass over a batch, keeping the activations needed for backprop.
    ///
    /// In [`Mode::Train`] dropout is sampled from `rng`; in [`Mode::Eval`] the pass is
    /// deterministic and `rng` is not touched.
    pub fn forward<R: Rng + ?Sized>(
        &self,
        inputs: &Array2<f32>,
        mode: Mode,
        rng: &mut R,
    ) -> Result<ForwardPass> {
        self.check_inputs(inputs)?;

        let hidden1 = self.hidden1.forward(inputs.view());
        let mut hidden2 = self.hidden2.forward(hidden1.view());
        let dropout_scale = self.dropout.apply(&mut hidden2, mode, rng);
        let logits = self.output.forward(hidden2.view());

        Ok(ForwardPass {
            hidden1,
            hidden2,
            dropout_scale,
            logits,
        })
    }

    /// Deterministic inference (no dropout).
    pub fn predict(&self, inputs: &Array2<f32>) -> Result<Array2<f32>> {
        self.check_inputs(inputs)?;

        let hidden1 = self.hidden1.forward(inputs.view());
        let hidden2 = self.hidden2.forward(hidden1.view());
        Ok(self.output.forward(hidden2.view()))
    }

    /// Backward pass for a batch.
    ///
    /// `pass` must come from [`Autoencoder::forward`] on the same `inputs`, and
    /// `d_logits` is the upstream gradient dL/d(logits).
    pub fn backward(
        &self,
        inputs: &Array2<f32>,
        pass: &ForwardPass,
        d_logits: Array2<f32>,
    ) -> Result<Gradients> {
        self.check_inputs(inputs)?;
        if pass.hidden1.nrows() != inputs.nrows() {
            return Err(Error::shape_mismatch(
                "forward pass hidden1",
                &[inputs.nrows(), self.hidden1_units()],
                pass.hidden1.shape(),
            ));
        }
        if d_logits.dim() != pass.logits.dim() {
            return Err(Error::shape_mismatch(
                "d_logits",
                pass.logits.shape(),
                d_logits.shape(),
            ));
        }

        let (output, mut d_hidden2) = self
            .output
            .backward(pass.hidden2.view(), &pass.logits, d_logits);
        if let Some(scale) = &pass.dropout_scale {
            d_hidden2 *= scale;
        }

        // Post-dropout activations are positive exactly where the unit was kept and active.
        let (hidden2, d_hidden1) = self
            .hidden2
            .backward(pass.hidden1.view(), &pass.hidden2, d_hidden2);
        let (hidden1, d_inputs) = self
            .hidden1
            .backward(inputs.view(), &pass.hidden1, d_hidden1);

        Ok(Gradients {
            hidden1,
            hidden2,
            output,
            d_inputs,
        })
    }

    /// Applies `param -= lr * grad` to every weight and bias.
    pub(crate) fn sgd_step(&mut self, grads: &Gradients, lr: f32) {
        self.hidden1.sgd_step(&grads.hidden1, lr);
        self.hidden2.sgd_step(&grads.hidden2, lr);
        self.output.sgd_step(&grads.output, lr);
    }

    fn check_inputs(&self, inputs: &Array2<f32>) -> Result<()> {
        if inputs.ncols() != self.embedding_dim() {
            return Err(Error::shape_mismatch(
                "inputs",
                &[inputs.nrows(), self.embedding_dim()],
                inputs.shape(),
            ));
        }
        Ok(())
    }
}
