use rand::Rng;

use crate::error::Result;
use crate::layers::{
    Dropout, LayerNorm, Mode, MultiHeadAttention, Parameterised, PositionwiseFeedForward,
};
use crate::mask::Mask;
use crate::tensor::Tensor;

/// Single decoder layer with three residual + layer-norm sublayers:
/// masked self-attention, cross-attention over the encoder memory, and the
/// position-wise feed-forward block.
pub struct DecoderLayer {
    pub self_attn: MultiHeadAttention,
    pub enc_dec_attn: MultiHeadAttention,
    pub ff: PositionwiseFeedForward,
    pub norm1: LayerNorm,
    pub norm2: LayerNorm,
    pub norm3: LayerNorm,
    dropout1: Dropout,
    dropout2: Dropout,
    dropout3: Dropout,
}

impl DecoderLayer {
    pub fn new<R: Rng + ?Sized>(
        model_dim: usize,
        num_heads: usize,
        ff_hidden: usize,
        p_drop: f32,
        eps: f32,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Self {
            self_attn: MultiHeadAttention::new(model_dim, num_heads, rng)?,
            enc_dec_attn: MultiHeadAttention::new(model_dim, num_heads, rng)?,
            ff: PositionwiseFeedForward::new(model_dim, ff_hidden, p_drop, rng),
            norm1: LayerNorm::new(model_dim, eps),
            norm2: LayerNorm::new(model_dim, eps),
            norm3: LayerNorm::new(model_dim, eps),
            dropout1: Dropout::new(p_drop),
            dropout2: Dropout::new(p_drop),
            dropout3: Dropout::new(p_drop),
        })
    }

    /// `causal_mask` applies to self-attention only; cross-attention sees
    /// every encoder position.
    pub fn forward(
        &self,
        x: &Tensor,
        enc_keys: &Tensor,
        enc_values: &Tensor,
        causal_mask: Option<&Mask>,
        mode: &mut Mode,
    ) -> Result<Tensor> {
        let masked = self.self_attn.forward(x, x, x, causal_mask)?;
        let masked = self.dropout1.forward(&masked, mode);
        let h = self.norm1.forward(&Tensor::add(x, &masked)?)?;

        let cross = self.enc_dec_attn.forward(&h, enc_keys, enc_values, None)?;
        let cross = self.dropout2.forward(&cross, mode);
        let h = self.norm2.forward(&Tensor::add(&h, &cross)?)?;

        let ff_out = self.ff.forward(&h, mode)?;
        let ff_out = self.dropout3.forward(&ff_out, mode);
        self.norm3.forward(&Tensor::add(&h, &ff_out)?)
    }
}

impl Parameterised for DecoderLayer {
    fn num_parameters(&self) -> usize {
        self.self_attn.num_parameters()
            + self.enc_dec_attn.num_parameters()
            + self.ff.num_parameters()
            + self.norm1.num_parameters()
            + self.norm2.num_parameters()
            + self.norm3.num_parameters()
    }
}

/// Stack of decoder layers. Each layer consumes the previous layer's output;
/// the encoder memory is handed unchanged to all of them.
pub struct Decoder {
    pub layers: Vec<DecoderLayer>,
}

impl Decoder {
    pub fn new<R: Rng + ?Sized>(
        n_layers: usize,
        model_dim: usize,
        num_heads: usize,
        ff_hidden: usize,
        p_drop: f32,
        eps: f32,
        rng: &mut R,
    ) -> Result<Self> {
        let layers = (0..n_layers)
            .map(|_| DecoderLayer::new(model_dim, num_heads, ff_hidden, p_drop, eps, rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layers })
    }

    pub fn forward(
        &self,
        x: &Tensor,
        memory: &Tensor,
        mask: Option<&Mask>,
        mode: &mut Mode,
    ) -> Result<Tensor> {
        let mut h = x.clone();
        for layer in &self.layers {
            h = layer.forward(&h, memory, memory, mask, mode)?;
        }
        Ok(h)
    }
}

impl Parameterised for Decoder {
    fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.num_parameters()).sum()
    }
}
