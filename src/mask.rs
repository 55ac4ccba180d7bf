//! Attention masks.
//!
//! A [`Mask`] is a rank-4 tensor of zeros and ones that must broadcast to
//! `[batch, 1, len_q, len_k]`. A zero forbids the query at that position from
//! attending to the key. Callers pass `Option<&Mask>`; `None` means every key
//! is visible.
//!
//! Every query row must keep at least one visible key. A fully masked row
//! makes the softmax produce NaN, and that NaN is propagated, not repaired.

use crate::error::{ModelError, Result};
use crate::tensor::Tensor;

#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    values: Tensor,
}

impl Mask {
    /// Lower-triangular `[1, 1, len, len]` mask: query `i` sees keys `0..=i`.
    pub fn causal(len: usize) -> Self {
        let mut data = vec![0.0; len * len];
        for i in 0..len {
            for j in 0..=i {
                data[i * len + j] = 1.0;
            }
        }
        Mask {
            values: Tensor::new(data, vec![1, 1, len, len]),
        }
    }

    /// `[batch, 1, 1, len]` mask hiding every key whose id is `pad_id`.
    ///
    /// Rows must share one length; see [`crate::models::TransformerModel`]
    /// for the validation applied to id batches.
    pub fn padding(ids: &[Vec<usize>], pad_id: usize) -> Result<Self> {
        let len = ids.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(ids.len() * len);
        for row in ids {
            if row.len() != len {
                return Err(ModelError::ShapeMismatch {
                    expected: vec![ids.len(), len],
                    got: vec![ids.len(), row.len()],
                });
            }
            data.extend(row.iter().map(|&id| if id == pad_id { 0.0 } else { 1.0 }));
        }
        Ok(Mask {
            values: Tensor::new(data, vec![ids.len(), 1, 1, len]),
        })
    }

    /// Wrap a 0/1 tensor of rank 2, 3 or 4. Missing leading dimensions are
    /// filled with ones.
    pub fn from_tensor(t: Tensor) -> Result<Self> {
        let rank = t.shape.len();
        if !(2..=4).contains(&rank) {
            return Err(ModelError::MaskShape {
                shape: t.shape.clone(),
                target: vec![0, 1, 0, 0],
            });
        }
        let mut shape = vec![1; 4 - rank];
        shape.extend_from_slice(&t.shape);
        Ok(Mask {
            values: Tensor::new(t.data, shape),
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.values.shape
    }

    /// Elementwise AND of two masks under broadcasting.
    pub fn combine(&self, other: &Mask) -> Result<Mask> {
        let mut shape = Vec::with_capacity(4);
        for (&a, &b) in self.shape().iter().zip(other.shape()) {
            let dim = match (a, b) {
                _ if a == b => a,
                (1, _) => b,
                (_, 1) => a,
                _ => {
                    return Err(ModelError::MaskShape {
                        shape: other.shape().to_vec(),
                        target: self.shape().to_vec(),
                    })
                }
            };
            shape.push(dim);
        }
        let a = self.values.broadcast_to(&shape)?;
        let b = other.values.broadcast_to(&shape)?;
        let data = a
            .data
            .iter()
            .zip(b.data.iter())
            .map(|(&x, &y)| if x != 0.0 && y != 0.0 { 1.0 } else { 0.0 })
            .collect();
        Ok(Mask {
            values: Tensor::new(data, shape),
        })
    }

    /// Validate against `[batch, 1, len_q, len_k]` and expand to a dense
    /// lookup table.
    pub fn resolve(&self, batch: usize, len_q: usize, len_k: usize) -> Result<ResolvedMask> {
        let target = [batch, 1, len_q, len_k];
        if !self.values.broadcasts_to(&target) {
            return Err(ModelError::MaskShape {
                shape: self.shape().to_vec(),
                target: target.to_vec(),
            });
        }
        let dense = self.values.broadcast_to(&target)?;
        Ok(ResolvedMask {
            allowed: dense.data.iter().map(|&v| v != 0.0).collect(),
            len_q,
            len_k,
        })
    }
}

/// A mask expanded to exactly `[batch, 1, len_q, len_k]`.
#[derive(Clone, Debug)]
pub struct ResolvedMask {
    allowed: Vec<bool>,
    len_q: usize,
    len_k: usize,
}

impl ResolvedMask {
    /// Whether query `q` of example `b` may attend to key `k`.
    pub fn allows(&self, b: usize, q: usize, k: usize) -> bool {
        self.allowed[(b * self.len_q + q) * self.len_k + k]
    }
}
