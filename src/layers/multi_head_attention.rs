use rand::Rng;

use super::layer::Parameterised;
use super::linear::Linear;
use crate::error::{ModelError, Result};
use crate::mask::Mask;
use crate::math::Matrix;
use crate::tensor::Tensor;

/// Scaled dot-product attention split across `num_heads` heads.
///
/// Used unchanged for self-attention (`query == key == value`) and for
/// cross-attention, where keys and values come from the encoder and may be
/// longer or shorter than the queries.
///
/// # Masking
///
/// Scores at positions where the mask is zero are replaced by negative
/// infinity before the softmax, so their weight is exactly `0`. The caller
/// must leave at least one visible key per query. A fully masked row yields
/// NaN, which surfaces as non-finite output.
pub struct MultiHeadAttention {
    pub wq: Linear,
    pub wk: Linear,
    pub wv: Linear,
    pub wo: Linear,
    num_heads: usize,
    d_k: usize,
}

impl MultiHeadAttention {
    pub fn new<R: Rng + ?Sized>(model_dim: usize, num_heads: usize, rng: &mut R) -> Result<Self> {
        if num_heads == 0 || model_dim % num_heads != 0 {
            return Err(ModelError::HeadMismatch {
                d_model: model_dim,
                num_heads,
            });
        }
        Ok(Self {
            wq: Linear::new(model_dim, model_dim, rng),
            wk: Linear::new(model_dim, model_dim, rng),
            wv: Linear::new(model_dim, model_dim, rng),
            wo: Linear::new(model_dim, model_dim, rng),
            num_heads,
            d_k: model_dim / num_heads,
        })
    }

    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    pub fn head_dim(&self) -> usize {
        self.d_k
    }

    fn model_dim(&self) -> usize {
        self.num_heads * self.d_k
    }

    /// Attend from `query` `[batch, len_q, d_model]` over `key`/`value`
    /// `[batch, len_k, d_model]`. Output has the shape of `query`.
    pub fn forward(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        mask: Option<&Mask>,
    ) -> Result<Tensor> {
        self.forward_with_weights(query, key, value, mask)
            .map(|(out, _)| out)
    }

    /// Like [`MultiHeadAttention::forward`], also returning the post-softmax
    /// weights as `[batch, heads, len_q, len_k]`.
    pub fn forward_with_weights(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        mask: Option<&Mask>,
    ) -> Result<(Tensor, Tensor)> {
        let (batch, len_q, len_k) = self.check_shapes(query, key, value)?;
        let mask = mask.map(|m| m.resolve(batch, len_q, len_k)).transpose()?;

        let q = self.wq.forward(query)?;
        let k = self.wk.forward(key)?;
        let v = self.wv.forward(value)?;

        let scale = 1.0 / (self.d_k as f32).sqrt();
        let mut weights = Vec::with_capacity(batch * self.num_heads * len_q * len_k);
        let mut outputs = Vec::with_capacity(batch);
        for b in 0..batch {
            let (qb, kb, vb) = (q.batch(b), k.batch(b), v.batch(b));
            let mut concat = Matrix::zeros(len_q, self.model_dim());
            for h in 0..self.num_heads {
                let qh = qb.slice_cols(h * self.d_k, self.d_k);
                let kh = kb.slice_cols(h * self.d_k, self.d_k);
                let vh = vb.slice_cols(h * self.d_k, self.d_k);
                let mut scores = Matrix::matmul(&qh, &kh.transpose());
                for s in scores.data.iter_mut() {
                    *s *= scale;
                }
                if let Some(m) = mask.as_ref() {
                    for i in 0..len_q {
                        for j in 0..len_k {
                            if !m.allows(b, i, j) {
                                scores.set(i, j, f32::NEG_INFINITY);
                            }
                        }
                    }
                }
                let attn = scores.softmax();
                let head_out = Matrix::matmul(&attn, &vh);
                concat.copy_into_cols(h * self.d_k, &head_out);
                weights.extend_from_slice(&attn.data);
            }
            outputs.push(concat);
        }

        let out = self.wo.forward(&Tensor::stack(&outputs))?;
        let weights = Tensor::new(weights, vec![batch, self.num_heads, len_q, len_k]);
        Ok((out, weights))
    }

    fn check_shapes(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
    ) -> Result<(usize, usize, usize)> {
        let d = self.model_dim();
        if query.shape.len() != 3 || query.shape[2] != d {
            return Err(ModelError::ShapeMismatch {
                expected: vec![query.shape.first().copied().unwrap_or(1), 0, d],
                got: query.shape.clone(),
            });
        }
        let (batch, len_q) = (query.shape[0], query.shape[1]);
        let len_k = key.shape.get(1).copied().unwrap_or(0);
        let kv_shape = vec![batch, len_k, d];
        for t in [key, value] {
            if t.shape != kv_shape {
                return Err(ModelError::ShapeMismatch {
                    expected: kv_shape,
                    got: t.shape.clone(),
                });
            }
        }
        if len_k == 0 && len_q > 0 {
            return Err(ModelError::NoKeys { len_q });
        }
        Ok((batch, len_q, len_k))
    }
}

impl Parameterised for MultiHeadAttention {
    fn num_parameters(&self) -> usize {
        [&self.wq, &self.wk, &self.wv, &self.wo]
            .iter()
            .map(|l| l.num_parameters())
            .sum()
    }
}
