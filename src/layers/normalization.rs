use super::layer::{Layer, Parameterised};
use super::mode::Mode;
use crate::error::{ModelError, Result};
use crate::tensor::Tensor;

/// Default numerical-stability epsilon.
pub const LAYER_NORM_EPS: f32 = 1e-6;

/// Layer normalization over the last (feature) dimension with learnable
/// scale (`gamma`) and shift (`beta`).
pub struct LayerNorm {
    pub gamma: Vec<f32>,
    pub beta: Vec<f32>,
    eps: f32,
}

impl LayerNorm {
    pub fn new(dim: usize, eps: f32) -> Self {
        Self {
            gamma: vec![1.0; dim],
            beta: vec![0.0; dim],
            eps,
        }
    }

    pub fn eps(&self) -> f32 {
        self.eps
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let cols = self.gamma.len();
        if x.last_dim() != cols {
            return Err(ModelError::ShapeMismatch {
                expected: vec![cols],
                got: x.shape.clone(),
            });
        }
        let mut out = x.clone();
        if cols == 0 {
            return Ok(out);
        }
        for row in out.data.chunks_mut(cols) {
            let mean = row.iter().sum::<f32>() / cols as f32;
            let var = row.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / cols as f32;
            let inv_std = 1.0 / (var + self.eps).sqrt();
            for ((v, g), b) in row.iter_mut().zip(&self.gamma).zip(&self.beta) {
                *v = g * (*v - mean) * inv_std + b;
            }
        }
        Ok(out)
    }
}

impl Parameterised for LayerNorm {
    fn num_parameters(&self) -> usize {
        self.gamma.len() + self.beta.len()
    }
}

impl Layer for LayerNorm {
    fn forward(&self, x: &Tensor, _mode: &mut Mode) -> Result<Tensor> {
        LayerNorm::forward(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_have_zero_mean_unit_variance() {
        let ln = LayerNorm::new(4, LAYER_NORM_EPS);
        let x = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, -2.0, 0.0, 2.0, 8.0], vec![1, 2, 4]);
        let y = ln.forward(&x).unwrap();
        for row in y.data.chunks(4) {
            let mean: f32 = row.iter().sum::<f32>() / 4.0;
            let var: f32 = row.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / 4.0;
            assert!(mean.abs() < 1e-5);
            assert!((var - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn applies_scale_and_shift() {
        let mut ln = LayerNorm::new(2, LAYER_NORM_EPS);
        ln.gamma = vec![2.0, 2.0];
        ln.beta = vec![1.0, 1.0];
        let y = ln.forward(&Tensor::new(vec![-1.0, 1.0], vec![1, 2])).unwrap();
        assert!((y.data[0] - -1.0).abs() < 1e-4);
        assert!((y.data[1] - 3.0).abs() < 1e-4);
    }

    #[test]
    fn constant_row_stays_finite() {
        let ln = LayerNorm::new(3, LAYER_NORM_EPS);
        let y = ln.forward(&Tensor::new(vec![5.0; 3], vec![1, 3])).unwrap();
        assert!(y.is_finite());
        assert!(y.data.iter().all(|v| v.abs() < 1e-6));
    }
}
