use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ModelError, Result};
use crate::layers::LAYER_NORM_EPS;

/// Model hyperparameters loaded from a TOML or JSON file.
///
/// Missing fields fall back to [`ModelConfig::default`], so a file only has
/// to name the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Rows of the shared embedding table and width of the output logits.
    pub vocab_size: usize,
    pub d_model: usize,
    pub num_heads: usize,
    /// Hidden width of the position-wise feed-forward block.
    pub ffn_hidden: usize,
    pub num_encoder_layers: usize,
    pub num_decoder_layers: usize,
    pub dropout_probability: f32,
    /// Number of rows in the positional table; longer inputs are rejected.
    pub max_len: usize,
    pub layer_norm_eps: f32,
    /// Seed for weight initialization. `None` defers to the `SEED`
    /// environment variable.
    pub seed: Option<u64>,
    /// Hide `pad_id` source positions from encoder self-attention.
    pub mask_source_padding: bool,
    pub pad_id: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            vocab_size: 151,
            d_model: 128,
            num_heads: 8,
            ffn_hidden: 32,
            num_encoder_layers: 2,
            num_decoder_layers: 2,
            dropout_probability: 0.2,
            max_len: 500,
            layer_norm_eps: LAYER_NORM_EPS,
            seed: None,
            mask_source_padding: false,
            pad_id: 0,
        }
    }
}

impl ModelConfig {
    /// Small single-layer configuration used by tests and benches.
    pub fn tiny(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            d_model: 8,
            num_heads: 2,
            ffn_hidden: 16,
            num_encoder_layers: 1,
            num_decoder_layers: 1,
            dropout_probability: 0.1,
            max_len: 32,
            seed: Some(0),
            ..Self::default()
        }
    }

    /// Load configuration from the given path. Supports TOML or JSON based on
    /// the file extension. The result is validated before it is returned.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let cfg: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => toml::from_str(&content)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_heads == 0 || self.d_model % self.num_heads != 0 {
            return Err(ModelError::HeadMismatch {
                d_model: self.d_model,
                num_heads: self.num_heads,
            });
        }
        let sizes = [
            ("vocab_size", self.vocab_size),
            ("d_model", self.d_model),
            ("ffn_hidden", self.ffn_hidden),
            ("max_len", self.max_len),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(ModelError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        if self.d_model % 2 != 0 {
            return Err(ModelError::InvalidConfig(format!(
                "d_model must be even for the sinusoidal table, got {}",
                self.d_model
            )));
        }
        if !(0.0..1.0).contains(&self.dropout_probability) {
            return Err(ModelError::InvalidConfig(format!(
                "dropout_probability must be in [0, 1), got {}",
                self.dropout_probability
            )));
        }
        if self.layer_norm_eps.is_nan() || self.layer_norm_eps <= 0.0 {
            return Err(ModelError::InvalidConfig(
                "layer_norm_eps must be positive".into(),
            ));
        }
        if self.mask_source_padding && self.pad_id >= self.vocab_size {
            return Err(ModelError::InvalidConfig(format!(
                "pad_id {} outside vocabulary of size {}",
                self.pad_id, self.vocab_size
            )));
        }
        Ok(())
    }
}
