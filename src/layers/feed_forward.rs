use rand::Rng;

use super::dropout::Dropout;
use super::layer::{Layer, Parameterised};
use super::linear::Linear;
use super::mode::Mode;
use super::relu;
use crate::error::Result;
use crate::tensor::Tensor;

/// Position-wise feed-forward block `d_model -> hidden -> d_model` with a
/// ReLU and dropout between the two projections.
///
/// Every sequence position is transformed independently with the same
/// weights.
pub struct PositionwiseFeedForward {
    pub w1: Linear,
    pub w2: Linear,
    dropout: Dropout,
}

impl PositionwiseFeedForward {
    pub fn new<R: Rng + ?Sized>(dim: usize, hidden: usize, p_drop: f32, rng: &mut R) -> Self {
        Self {
            w1: Linear::new(dim, hidden, rng),
            w2: Linear::new(hidden, dim, rng),
            dropout: Dropout::new(p_drop),
        }
    }

    pub fn forward(&self, x: &Tensor, mode: &mut Mode) -> Result<Tensor> {
        let mut h = self.w1.forward(x)?;
        relu::forward_tensor(&mut h);
        let h = self.dropout.forward(&h, mode);
        self.w2.forward(&h)
    }
}

impl Parameterised for PositionwiseFeedForward {
    fn num_parameters(&self) -> usize {
        self.w1.num_parameters() + self.w2.num_parameters()
    }
}

impl Layer for PositionwiseFeedForward {
    fn forward(&self, x: &Tensor, mode: &mut Mode) -> Result<Tensor> {
        PositionwiseFeedForward::forward(self, x, mode)
    }
}
