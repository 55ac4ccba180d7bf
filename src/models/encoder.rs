use rand::Rng;

use crate::error::Result;
use crate::layers::{
    Dropout, LayerNorm, Mode, MultiHeadAttention, Parameterised, PositionwiseFeedForward,
};
use crate::mask::Mask;
use crate::tensor::Tensor;

/// Single encoder layer: self-attention and feed-forward sublayers, each
/// followed by dropout, a residual add and post-residual layer normalization.
pub struct EncoderLayer {
    pub attn: MultiHeadAttention,
    pub ff: PositionwiseFeedForward,
    pub norm1: LayerNorm,
    pub norm2: LayerNorm,
    dropout1: Dropout,
    dropout2: Dropout,
}

impl EncoderLayer {
    pub fn new<R: Rng + ?Sized>(
        model_dim: usize,
        num_heads: usize,
        ff_hidden: usize,
        p_drop: f32,
        eps: f32,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Self {
            attn: MultiHeadAttention::new(model_dim, num_heads, rng)?,
            ff: PositionwiseFeedForward::new(model_dim, ff_hidden, p_drop, rng),
            norm1: LayerNorm::new(model_dim, eps),
            norm2: LayerNorm::new(model_dim, eps),
            dropout1: Dropout::new(p_drop),
            dropout2: Dropout::new(p_drop),
        })
    }

    /// `mask`, when present, restricts which source positions every query
    /// may attend to. Output has the shape of `x`.
    pub fn forward(&self, x: &Tensor, mask: Option<&Mask>, mode: &mut Mode) -> Result<Tensor> {
        let attn_out = self.attn.forward(x, x, x, mask)?;
        let attn_out = self.dropout1.forward(&attn_out, mode);
        let h = self.norm1.forward(&Tensor::add(&attn_out, x)?)?;
        let ff_out = self.ff.forward(&h, mode)?;
        let ff_out = self.dropout2.forward(&ff_out, mode);
        self.norm2.forward(&Tensor::add(&ff_out, &h)?)
    }
}

impl Parameterised for EncoderLayer {
    fn num_parameters(&self) -> usize {
        self.attn.num_parameters()
            + self.ff.num_parameters()
            + self.norm1.num_parameters()
            + self.norm2.num_parameters()
    }
}

/// Stack of independently parameterised encoder layers applied in order.
pub struct Encoder {
    pub layers: Vec<EncoderLayer>,
}

impl Encoder {
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
            .map(|_| EncoderLayer::new(model_dim, num_heads, ff_hidden, p_drop, eps, rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layers })
    }

    /// Returns the memory consumed by every decoder layer.
    pub fn forward(&self, x: &Tensor, mask: Option<&Mask>, mode: &mut Mode) -> Result<Tensor> {
        let mut h = x.clone();
        for layer in &self.layers {
            h = layer.forward(&h, mask, mode)?;
        }
        Ok(h)
    }
}

impl Parameterised for Encoder {
    fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.num_parameters()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LAYER_NORM_EPS;
    use crate::rng::seeded_rng;

    fn input(batch: usize, len: usize, dim: usize) -> Tensor {
        let data = (0..batch * len * dim).map(|i| ((i % 7) as f32 - 3.0) * 0.3).collect();
        Tensor::new(data, vec![batch, len, dim])
    }

    #[test]
    fn layer_preserves_shape() {
        let mut rng = seeded_rng(Some(9));
        let layer = EncoderLayer::new(8, 2, 16, 0.1, LAYER_NORM_EPS, &mut rng).unwrap();
        let x = input(2, 5, 8);
        let y = layer.forward(&x, None, &mut Mode::Inference).unwrap();
        assert_eq!(y.shape, x.shape);
        assert!(y.is_finite());
    }

    #[test]
    fn padding_mask_hides_padded_source_positions() {
        let mut rng = seeded_rng(Some(9));
        let layer = EncoderLayer::new(8, 2, 16, 0.0, LAYER_NORM_EPS, &mut rng).unwrap();
        let mask = Mask::padding(&[vec![4, 5, 0]], 0).unwrap();
        let a = input(1, 3, 8);
        let mut b = a.clone();
        for c in 0..8 {
            b.set(&[0, 2, c], 42.0);
        }
        let ya = layer.forward(&a, Some(&mask), &mut Mode::Inference).unwrap();
        let yb = layer.forward(&b, Some(&mask), &mut Mode::Inference).unwrap();
        // the first two positions never look at the padded key
        for i in 0..16 {
            assert!((ya.data[i] - yb.data[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn stack_has_independent_layers() {
        let mut rng = seeded_rng(Some(9));
        let enc = Encoder::new(2, 8, 2, 16, 0.1, LAYER_NORM_EPS, &mut rng).unwrap();
        assert_eq!(enc.layers.len(), 2);
        assert_ne!(enc.layers[0].attn.wq.w, enc.layers[1].attn.wq.w);
        let x = input(1, 4, 8);
        let y = enc.forward(&x, None, &mut Mode::Inference).unwrap();
        assert_eq!(y.shape, x.shape);
        assert_eq!(enc.num_parameters(), 2 * enc.layers[0].num_parameters());
    }
}
