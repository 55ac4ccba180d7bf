use super::mode::Mode;
use crate::error::Result;
use crate::tensor::Tensor;

/// Anything that owns learned parameters.
pub trait Parameterised {
    /// Total number of scalar parameters.
    fn num_parameters(&self) -> usize;
}

/// Common interface for position-wise layers mapping one tensor to another.
pub trait Layer: Parameterised {
    /// Forward pass; `mode` decides whether dropout is applied.
    fn forward(&self, x: &Tensor, mode: &mut Mode) -> Result<Tensor>;
}
