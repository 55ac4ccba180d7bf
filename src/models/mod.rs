pub mod decoder;
pub mod encoder;
pub mod transformer;

pub use decoder::{Decoder, DecoderLayer};
pub use encoder::{Encoder, EncoderLayer};
pub use transformer::TransformerModel;
