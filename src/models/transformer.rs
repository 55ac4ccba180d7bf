use crate::config::ModelConfig;
use crate::error::Result;
use crate::layers::{Embedding, Linear, Mode, Parameterised};
use crate::mask::Mask;
use crate::positional::PositionalEncoding;
use crate::rng::seeded_rng;
use crate::tensor::Tensor;
use crate::util::logging;

use super::decoder::Decoder;
use super::encoder::Encoder;

/// Encoder-decoder Transformer producing per-position vocabulary logits.
///
/// Source and target ids share one embedding table. Weights are drawn once
/// from the configured seed and never change afterwards, so every forward
/// pass in [`Mode::Inference`] is a pure function of its inputs.
pub struct TransformerModel {
    pub embedding: Embedding,
    pub positional: PositionalEncoding,
    pub encoder: Encoder,
    pub decoder: Decoder,
    pub projection: Linear,
    config: ModelConfig,
}

impl TransformerModel {
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);
        let embedding = Embedding::new(config.vocab_size, config.d_model, &mut rng);
        let positional = PositionalEncoding::new(config.d_model, config.max_len);
        let encoder = Encoder::new(
            config.num_encoder_layers,
            config.d_model,
            config.num_heads,
            config.ffn_hidden,
            config.dropout_probability,
            config.layer_norm_eps,
            &mut rng,
        )?;
        let decoder = Decoder::new(
            config.num_decoder_layers,
            config.d_model,
            config.num_heads,
            config.ffn_hidden,
            config.dropout_probability,
            config.layer_norm_eps,
            &mut rng,
        )?;
        let projection = Linear::new(config.d_model, config.vocab_size, &mut rng);
        let model = Self {
            embedding,
            positional,
            encoder,
            decoder,
            projection,
            config,
        };
        logging::log_model_summary(&model.config, model.num_parameters());
        Ok(model)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Embedding lookup followed by the positional table.
    ///
    /// Fails on ragged rows, ids outside the vocabulary and sequences longer
    /// than `max_len`.
    pub fn embed(&self, ids: &[Vec<usize>]) -> Result<Tensor> {
        let x = self.embedding.forward(ids)?;
        self.positional.apply(&x)
    }

    /// Padding mask for `src_ids` when `mask_source_padding` is enabled.
    pub fn source_mask(&self, src_ids: &[Vec<usize>]) -> Result<Option<Mask>> {
        if !self.config.mask_source_padding {
            return Ok(None);
        }
        Mask::padding(src_ids, self.config.pad_id).map(Some)
    }

    /// Run the encoder stack and return the `[batch, src_len, d_model]`
    /// memory.
    pub fn encode(
        &self,
        src_ids: &[Vec<usize>],
        src_mask: Option<&Mask>,
        mode: &mut Mode,
    ) -> Result<Tensor> {
        let x = self.embed(src_ids)?;
        self.encoder.forward(&x, src_mask, mode)
    }

    /// Run the decoder stack against `memory` and project to logits of
    /// shape `[batch, tgt_len, vocab_size]`.
    pub fn decode(
        &self,
        tgt_ids: &[Vec<usize>],
        memory: &Tensor,
        tgt_mask: Option<&Mask>,
        mode: &mut Mode,
    ) -> Result<Tensor> {
        let y = self.embed(tgt_ids)?;
        let h = self.decoder.forward(&y, memory, tgt_mask, mode)?;
        self.projection.forward(&h)
    }

    /// Full forward pass. Without `tgt_mask` the decoder self-attention is
    /// unmasked and every position sees the whole target.
    pub fn forward(
        &self,
        src_ids: &[Vec<usize>],
        tgt_ids: &[Vec<usize>],
        tgt_mask: Option<&Mask>,
        mode: &mut Mode,
    ) -> Result<Tensor> {
        let src_mask = self.source_mask(src_ids)?;
        let memory = self.encode(src_ids, src_mask.as_ref(), mode)?;
        self.decode(tgt_ids, &memory, tgt_mask, mode)
    }
}

impl Parameterised for TransformerModel {
    fn num_parameters(&self) -> usize {
        self.embedding.num_parameters()
            + self.encoder.num_parameters()
            + self.decoder.num_parameters()
            + self.projection.num_parameters()
    }
}
