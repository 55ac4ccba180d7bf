use rand::Rng;

use super::layer::{Layer, Parameterised};
use super::mode::Mode;
use crate::error::{ModelError, Result};
use crate::math::Matrix;
use crate::tensor::Tensor;

/// Affine projection `y = x·W + b` applied to the last dimension.
///
/// `w` has shape `(in_dim, out_dim)`. Weights and bias are drawn uniformly
/// from `±1/sqrt(in_dim)`.
pub struct Linear {
    pub w: Matrix,
    pub b: Vec<f32>,
}

impl Linear {
    pub fn new<R: Rng + ?Sized>(in_dim: usize, out_dim: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (in_dim.max(1) as f32).sqrt();
        let w = Matrix::from_vec(
            in_dim,
            out_dim,
            (0..in_dim * out_dim)
                .map(|_| rng.gen_range(-bound..=bound))
                .collect(),
        );
        let b = (0..out_dim).map(|_| rng.gen_range(-bound..=bound)).collect();
        Self { w, b }
    }

    pub fn in_dim(&self) -> usize {
        self.w.rows
    }

    pub fn out_dim(&self) -> usize {
        self.w.cols
    }

    /// Project every row of `x`; all leading dimensions are preserved.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        if x.last_dim() != self.in_dim() {
            let mut expected = x.shape.clone();
            if let Some(last) = expected.last_mut() {
                *last = self.in_dim();
            }
            return Err(ModelError::ShapeMismatch {
                expected,
                got: x.shape.clone(),
            });
        }
        let mut y = Matrix::matmul(&x.to_matrix(), &self.w);
        for row in y.data.chunks_mut(self.out_dim().max(1)) {
            for (v, b) in row.iter_mut().zip(&self.b) {
                *v += b;
            }
        }
        let mut shape = x.shape.clone();
        if let Some(last) = shape.last_mut() {
            *last = self.out_dim();
        }
        Ok(Tensor::from_matrix_with_shape(y, shape))
    }
}

impl Parameterised for Linear {
    fn num_parameters(&self) -> usize {
        self.w.data.len() + self.b.len()
    }
}

impl Layer for Linear {
    fn forward(&self, x: &Tensor, _mode: &mut Mode) -> Result<Tensor> {
        Linear::forward(self, x)
    }
}
