use rand::Rng;
use rand_distr::StandardNormal;

use super::layer::Parameterised;
use crate::error::{ModelError, Result};
use crate::math::Matrix;
use crate::tensor::Tensor;

/// Embedding layer: maps token ids to dense `model_dim` vectors.
pub struct Embedding {
    pub table: Matrix, // (vocab_size x model_dim)
}

impl Embedding {
    /// Table entries are drawn from a standard normal distribution.
    pub fn new<R: Rng + ?Sized>(vocab_size: usize, model_dim: usize, rng: &mut R) -> Self {
        let data = (0..vocab_size * model_dim)
            .map(|_| rng.sample::<f32, _>(StandardNormal))
            .collect();
        Self {
            table: Matrix::from_vec(vocab_size, model_dim, data),
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.table.rows
    }

    pub fn model_dim(&self) -> usize {
        self.table.cols
    }

    /// Look up a rectangular batch of id sequences, giving
    /// `[batch, seq_len, model_dim]`.
    pub fn forward(&self, ids: &[Vec<usize>]) -> Result<Tensor> {
        let seq_len = ids.first().map(Vec::len).unwrap_or(0);
        let dim = self.model_dim();
        let mut data = Vec::with_capacity(ids.len() * seq_len * dim);
        for row in ids {
            if row.len() != seq_len {
                return Err(ModelError::ShapeMismatch {
                    expected: vec![ids.len(), seq_len],
                    got: vec![ids.len(), row.len()],
                });
            }
            for &id in row {
                if id >= self.vocab_size() {
                    return Err(ModelError::TokenOutOfRange {
                        id,
                        vocab_size: self.vocab_size(),
                    });
                }
                data.extend_from_slice(self.table.row(id));
            }
        }
        Ok(Tensor::new(data, vec![ids.len(), seq_len, dim]))
    }
}

impl Parameterised for Embedding {
    fn num_parameters(&self) -> usize {
        self.table.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    #[test]
    fn looks_up_rows() {
        let mut rng = seeded_rng(Some(0));
        let emb = Embedding::new(3, 2, &mut rng);
        let out = emb.forward(&[vec![2, 0]]).unwrap();
        assert_eq!(out.shape, vec![1, 2, 2]);
        assert_eq!(&out.data[..2], emb.table.row(2));
        assert_eq!(&out.data[2..], emb.table.row(0));
    }

    #[test]
    fn out_of_range_id_is_an_error() {
        let mut rng = seeded_rng(Some(0));
        let emb = Embedding::new(3, 2, &mut rng);
        let err = emb.forward(&[vec![1, 3]]).unwrap_err();
        assert!(matches!(err, ModelError::TokenOutOfRange { id: 3, vocab_size: 3 }));
    }

    #[test]
    fn ragged_batch_is_an_error() {
        let mut rng = seeded_rng(Some(0));
        let emb = Embedding::new(3, 2, &mut rng);
        assert!(emb.forward(&[vec![1, 2], vec![1]]).is_err());
    }
}
