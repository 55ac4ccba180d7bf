pub mod config;
pub mod decoding;
pub mod error;
pub mod layers;
pub mod mask;
pub mod math;
pub mod models;
pub mod positional;
pub mod rng;
pub mod tensor;
pub mod util;
pub mod vocab;

pub use config::ModelConfig;
pub use decoding::{greedy_decode, translate, translate_iterative, DecodeMode, Translator};
pub use error::{ModelError, Result};
pub use layers::Mode;
pub use mask::Mask;
pub use models::TransformerModel;
pub use tensor::Tensor;
pub use vocab::Vocabulary;
