//! Model configuration.
//!
//! `AutoencoderConfig` describes the network shape and dropout rate. With the `serde`
//! feature it can be read from and written to JSON.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dropout::DEFAULT_KEEP_PROB;
use crate::{Dropout, Error, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoencoderConfig {
    /// Width of the inputs and of the reconstructed logits.
    pub embedding_dim: usize,
    pub hidden1_units: usize,
    /// Bottleneck width.
    pub hidden2_units: usize,
    /// Probability of keeping a `hidden2` unit during training.
    #[cfg_attr(feature = "serde", serde(default = "default_keep_prob"))]
    pub keep_prob: f32,
}

impl AutoencoderConfig {
    /// Config with the default `keep_prob` (0.8).
    pub fn new(embedding_dim: usize, hidden1_units: usize, hidden2_units: usize) -> Self {
        Self {
            embedding_dim,
            hidden1_units,
            hidden2_units,
            keep_prob: DEFAULT_KEEP_PROB,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(Error::InvalidConfig("embedding_dim must be > 0".to_owned()));
        }
        if self.hidden1_units == 0 || self.hidden2_units == 0 {
            return Err(Error::InvalidConfig(format!(
                "hidden units must be > 0, got hidden1={} hidden2={}",
                self.hidden1_units, self.hidden2_units
            )));
        }
        Dropout::new(self.keep_prob)?;
        Ok(())
    }
}

#[cfg(feature = "serde")]
fn default_keep_prob() -> f32 {
    DEFAULT_KEEP_PROB
}

#[cfg(feature = "serde")]
impl AutoencoderConfig {
    /// Serialize the config to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidData(format!("failed to serialize config: {e}")))
    }

    /// Parse and validate a config from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_keep_prob() {
        let cfg = AutoencoderConfig::new(3, 5, 2);
        assert_eq!(cfg.keep_prob, 0.8);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_dims_and_bad_keep_prob() {
        assert!(AutoencoderConfig::new(0, 5, 2).validate().is_err());
        assert!(AutoencoderConfig::new(3, 0, 2).validate().is_err());
        assert!(AutoencoderConfig::new(3, 5, 0).validate().is_err());

        let cfg = AutoencoderConfig {
            keep_prob: 0.0,
            ..AutoencoderConfig::new(3, 5, 2)
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_defaults_keep_prob_and_validates() {
        let cfg = AutoencoderConfig::from_json_str(
            r#"{"embedding_dim":3,"hidden1_units":5,"hidden2_units":2}"#,
        )
        .unwrap();
        assert_eq!(cfg, AutoencoderConfig::new(3, 5, 2));

        let json = cfg.to_json_string_pretty().unwrap();
        assert_eq!(AutoencoderConfig::from_json_str(&json).unwrap(), cfg);

        let bad = r#"{"embedding_dim":3,"hidden1_units":5,"hidden2_units":2,"keep_prob":1.5}"#;
        let err = AutoencoderConfig::from_json_str(bad).unwrap_err();
        assert!(format!("{err}").contains("keep_prob"));
    }
}
