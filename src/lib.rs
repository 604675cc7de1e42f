//! A small masked-reconstruction autoencoder.
//!
//! `rust-autoencoder` implements a bottleneck network
//! `embedding_dim -> hidden1 -> hidden2 -> embedding_dim` on top of `ndarray`, with
//! hand-derived backprop and plain gradient descent.
//!
//! The crate exposes four entry points that compose in pipeline order:
//!
//! - [`inference`]: inputs `(batch, embedding_dim)` -> logits of the same shape.
//! - [`loss()`]: `0.5 * sum((logits - labels)^2)` over masked-in entries.
//! - [`training`]: a [`TrainOp`] that applies one gradient-descent step per call.
//! - [`evaluation`]: `[correct, total]` over masked-in entries, where "correct" means
//!   [`almost_equal`] (the difference rounds to zero).
//!
//! # Masks
//!
//! A mask is a boolean `ndarray` array of any shape that broadcasts to the logits,
//! e.g. `(batch, dim)`, `(1, dim)`, `(batch, 1)` or `(dim,)`. Entries where the mask
//! is false (unobserved values) are ignored by the loss, its gradient and evaluation.
//!
//! # Panics vs `Result`
//!
//! Every public entry point validates shapes and returns [`Error::InvalidShape`] on a
//! mismatch. Non-finite values are not detected; they propagate through the
//! arithmetic.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f32`.
//! - Layer weights have shape `(in_dim, out_dim)`, biases `(out_dim,)`.
//! - Batches are row-major `(batch_size, embedding_dim)`.
//!
//! # Quick start
//!
//! ```rust
//! use ndarray::array;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use rust_autoencoder::{AutoencoderBuilder, Batch, Mode};
//!
//! # fn main() -> rust_autoencoder::Result<()> {
//! let mut model = AutoencoderBuilder::new(3)?
//!     .hidden_units(5, 2)?
//!     .build_with_seed(0)?;
//!
//! let inputs = array![[0.0_f32, 1.0, 0.5], [1.0, 0.0, 0.25]];
//! let mask = array![[true, true, false], [true, false, true]];
//! let batch = Batch::reconstruction(inputs.clone(), &mask)?;
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mut train_op = rust_autoencoder::training(0.01)?;
//! for _ in 0..10 {
//!     train_op.run(&mut model, &batch, &mut rng)?;
//! }
//!
//! let logits = rust_autoencoder::inference(&model, &inputs, Mode::Eval, &mut rng)?;
//! let loss = rust_autoencoder::loss(&logits, &inputs, &mask)?;
//! let [correct, total] = rust_autoencoder::evaluation(&logits, &inputs, &mask)?.to_array();
//! assert!(loss >= 0.0);
//! assert!(correct <= total);
//! assert_eq!(train_op.global_step(), 10);
//! # Ok(())
//! # }
//! ```
//!
//! # Custom training loops
//!
//! The pieces behind [`TrainOp::run`] are public:
//!
//! ```rust
//! use ndarray::array;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use rust_autoencoder::{AutoencoderBuilder, Mode, TrainOp, loss};
//!
//! # fn main() -> rust_autoencoder::Result<()> {
//! let mut model = AutoencoderBuilder::new(3)?
//!     .hidden_units(4, 2)?
//!     .build_with_seed(0)?;
//! let mut train_op = TrainOp::new(1e-2)?;
//! let mut rng = StdRng::seed_from_u64(0);
//!
//! let x = array![[0.1_f32, -0.2, 0.3]];
//! let pass = model.forward(&x, Mode::Train, &mut rng)?;
//! let (_loss, d_logits) = loss::masked_l2_backward(pass.logits(), &x, &ndarray::arr0(true))?;
//! let grads = model.backward(&x, &pass, d_logits)?;
//! train_op.apply(&mut model, &grads);
//! # Ok(())
//! # }
//! ```

use ndarray::{Array2, ArrayBase, Data, Dimension};
use rand::Rng;

pub mod activation;
pub mod builder;
pub mod config;
pub mod data;
pub mod dropout;
pub mod error;
pub mod layer;
pub mod loss;
pub mod metrics;
pub mod model;
pub mod optim;
pub mod train;

pub use activation::Activation;
pub use builder::AutoencoderBuilder;
pub use config::AutoencoderConfig;
pub use data::Batch;
pub use dropout::{Dropout, Mode};
pub use error::{Error, Result};
pub use layer::{Init, Layer, LayerGradients};
pub use metrics::{Evaluation, almost_equal, almost_equal_value};
pub use model::{Autoencoder, ForwardPass, Gradients};
pub use optim::Sgd;
pub use train::{EvalReport, StepReport, TrainOp};

/// Run the network forward and return the logits, shape `(batch, embedding_dim)`.
///
/// In [`Mode::Train`] dropout is sampled from `rng`; [`Mode::Eval`] is deterministic.
pub fn inference<R: Rng + ?Sized>(
    model: &Autoencoder,
    inputs: &Array2<f32>,
    mode: Mode,
    rng: &mut R,
) -> Result<Array2<f32>> {
    model.forward(inputs, mode, rng).map(ForwardPass::into_logits)
}

/// Masked L2 reconstruction loss: `0.5 * sum over mask of (logits - labels)^2`.
///
/// Thin wrapper around [`loss::masked_l2`].
pub fn loss<S, D>(logits: &Array2<f32>, labels: &Array2<f32>, mask: &ArrayBase<S, D>) -> Result<f32>
where
    S: Data<Elem = bool>,
    D: Dimension,
{
    loss::masked_l2(logits, labels, mask)
}

/// Create the training step for the masked L2 loss with the given learning rate.
///
/// Call [`TrainOp::run`] once per batch; each call updates every parameter and
/// increments the global step.
pub fn training(learning_rate: f32) -> Result<TrainOp> {
    TrainOp::new(learning_rate)
}

/// `[correct, total]` counts over masked-in entries.
///
/// Thin wrapper around [`metrics::evaluate`].
pub fn evaluation<S, D>(
    logits: &Array2<f32>,
    labels: &Array2<f32>,
    mask: &ArrayBase<S, D>,
) -> Result<Evaluation>
where
    S: Data<Elem = bool>,
    D: Dimension,
{
    metrics::evaluate(logits, labels, mask)
}
