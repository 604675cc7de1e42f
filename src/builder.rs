//! Model builder.
//!
//! `AutoencoderBuilder` is the recommended way to define a model. It makes the
//! network shape explicit and initialises parameters the same way for every model:
//!
//! - weights: truncated normal with `stddev = 1 / sqrt(in_dim)`
//! - biases: zeros
//!
//! Hidden layers use ReLU and the output projection is linear.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Activation, Autoencoder, AutoencoderConfig, Dropout, Error, Layer, Result};

#[derive(Debug, Clone)]
/// Builder for an `Autoencoder`.
///
/// Example:
///
/// ```rust
/// use rust_autoencoder::AutoencoderBuilder;
///
/// # fn main() -> rust_autoencoder::Result<()> {
/// let model = AutoencoderBuilder::new(3)?
///     .hidden_units(5, 2)?
///     .keep_prob(0.8)?
///     .build_with_seed(0)?;
/// assert_eq!(model.embedding_dim(), 3);
/// # Ok(())
/// # }
/// ```
pub struct AutoencoderBuilder {
    embedding_dim: usize,
    hidden_units: Option<(usize, usize)>,
    dropout: Dropout,
}

impl AutoencoderBuilder {
    /// Start building an autoencoder over embeddings of width `embedding_dim`.
    pub fn new(embedding_dim: usize) -> Result<Self> {
        if embedding_dim == 0 {
            return Err(Error::InvalidConfig("embedding_dim must be > 0".to_owned()));
        }
        Ok(Self {
            embedding_dim,
            hidden_units: None,
            dropout: Dropout::default(),
        })
    }

    /// Builder preloaded from a config.
    pub fn from_config(cfg: &AutoencoderConfig) -> Result<Self> {
        cfg.validate()?;
        Self::new(cfg.embedding_dim)?
            .hidden_units(cfg.hidden1_units, cfg.hidden2_units)?
            .keep_prob(cfg.keep_prob)
    }

    /// Set the widths of the two hidden layers.
    pub fn hidden_units(mut self, hidden1: usize, hidden2: usize) -> Result<Self> {
        if hidden1 == 0 || hidden2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "hidden units must be > 0, got hidden1={hidden1} hidden2={hidden2}"
            )));
        }
        self.hidden_units = Some((hidden1, hidden2));
        Ok(self)
    }

    /// Set the dropout keep probability for the second hidden layer.
    pub fn keep_prob(mut self, keep_prob: f32) -> Result<Self> {
        self.dropout = Dropout::new(keep_prob)?;
        Ok(self)
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Autoencoder> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Autoencoder> {
        let (h1, h2) = self.hidden_units.ok_or_else(|| {
            Error::InvalidConfig("hidden_units must be set before build".to_owned())
        })?;

        let hidden1 = Layer::new_with_rng(self.embedding_dim, h1, Activation::ReLU, rng)?;
        let hidden2 = Layer::new_with_rng(h1, h2, Activation::ReLU, rng)?;
        let output = Layer::new_with_rng(h2, self.embedding_dim, Activation::Identity, rng)?;

        tracing::debug!(
            embedding_dim = self.embedding_dim,
            hidden1_units = h1,
            hidden2_units = h2,
            keep_prob = self.dropout.keep_prob(),
            "built autoencoder"
        );
        Autoencoder::from_layers(hidden1, hidden2, output, self.dropout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_units_are_required() {
        let err = AutoencoderBuilder::new(3)
            .unwrap()
            .build_with_seed(0)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_sizes() {
        assert!(AutoencoderBuilder::new(0).is_err());
        assert!(AutoencoderBuilder::new(3).unwrap().hidden_units(0, 2).is_err());
        assert!(AutoencoderBuilder::new(3).unwrap().keep_prob(0.0).is_err());
    }

    #[test]
    fn from_config_round_trips_shape() {
        let cfg = AutoencoderConfig::new(3, 5, 2);
        let model = AutoencoderBuilder::from_config(&cfg)
            .unwrap()
            .build_with_seed(1)
            .unwrap();
        assert_eq!(model.config(), cfg);

        let layers = model.layers();
        assert_eq!(layers[0].1.activation(), Activation::ReLU);
        assert_eq!(layers[1].1.activation(), Activation::ReLU);
        assert_eq!(layers[2].1.activation(), Activation::Identity);
    }
}
