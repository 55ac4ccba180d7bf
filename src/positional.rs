use crate::error::{ModelError, Result};
use crate::math::Matrix;
use crate::tensor::Tensor;

/// Base of the geometric frequency progression across channels.
pub const FREQUENCY_BASE: f32 = 1000.0;

/// Fixed sinusoidal position table, precomputed once for `max_len` positions.
///
/// `table[pos][2i] = sin(pos / 1000^(2i/d_model))` and
/// `table[pos][2i+1] = cos(pos / 1000^(2i/d_model))`.
pub struct PositionalEncoding {
    table: Matrix,
}

impl PositionalEncoding {
    pub fn new(d_model: usize, max_len: usize) -> Self {
        Self {
            table: positional_encoding(max_len, d_model),
        }
    }

    pub fn max_len(&self) -> usize {
        self.table.rows
    }

    pub fn d_model(&self) -> usize {
        self.table.cols
    }

    pub fn table(&self) -> &Matrix {
        &self.table
    }

    /// Add the first `seq_len` rows of the table to every example of a
    /// `[batch, seq_len, d_model]` tensor.
    pub fn apply(&self, x: &Tensor) -> Result<Tensor> {
        if x.shape.len() != 3 || x.shape[2] != self.d_model() {
            return Err(ModelError::ShapeMismatch {
                expected: vec![x.shape.first().copied().unwrap_or(1), 0, self.d_model()],
                got: x.shape.clone(),
            });
        }
        let seq_len = x.shape[1];
        if seq_len > self.max_len() {
            return Err(ModelError::SequenceTooLong {
                len: seq_len,
                max_len: self.max_len(),
            });
        }
        let width = seq_len * self.d_model();
        let pe = &self.table.data[..width];
        let mut out = x.clone();
        for example in out.data.chunks_mut(width.max(1)) {
            for (o, p) in example.iter_mut().zip(pe) {
                *o += p;
            }
        }
        Ok(out)
    }
}

/// Generates the sinusoidal table as a `seq_len x model_dim` matrix.
pub fn positional_encoding(seq_len: usize, model_dim: usize) -> Matrix {
    let mut enc = Matrix::zeros(seq_len, model_dim);
    for pos in 0..seq_len {
        for c in 0..model_dim {
            let even = (c / 2) * 2;
            let angle =
                pos as f32 / FREQUENCY_BASE.powf(even as f32 / model_dim as f32);
            let val = if c % 2 == 0 { angle.sin() } else { angle.cos() };
            enc.set(pos, c, val);
        }
    }
    enc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_row_alternates_zero_and_one() {
        let pe = PositionalEncoding::new(6, 4);
        let row = pe.table().row(0);
        assert_eq!(row, &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn apply_adds_table_to_every_example() {
        let pe = PositionalEncoding::new(4, 3);
        let x = Tensor::zeros(vec![2, 2, 4]);
        let y = pe.apply(&x).unwrap();
        assert_eq!(y.shape, vec![2, 2, 4]);
        for b in 0..2 {
            for pos in 0..2 {
                for c in 0..4 {
                    assert_eq!(y.get(&[b, pos, c]), pe.table().get(pos, c));
                }
            }
        }
    }

    #[test]
    fn apply_accepts_max_len_and_rejects_longer() {
        let pe = PositionalEncoding::new(4, 3);
        assert!(pe.apply(&Tensor::zeros(vec![1, 3, 4])).is_ok());
        let err = pe.apply(&Tensor::zeros(vec![1, 4, 4])).unwrap_err();
        assert!(matches!(err, ModelError::SequenceTooLong { len: 4, max_len: 3 }));
    }
}
