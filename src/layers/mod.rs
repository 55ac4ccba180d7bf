pub mod dropout;
pub mod embedding;
pub mod feed_forward;
pub mod layer;
pub mod linear;
pub mod mode;
pub mod multi_head_attention;
pub mod normalization;
pub mod relu;

pub use dropout::Dropout;
pub use embedding::Embedding;
pub use feed_forward::PositionwiseFeedForward;
pub use layer::{Layer, Parameterised};
pub use linear::Linear;
pub use mode::Mode;
pub use multi_head_attention::MultiHeadAttention;
pub use normalization::{LayerNorm, LAYER_NORM_EPS};
