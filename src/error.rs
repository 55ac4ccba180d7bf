use thiserror::Error;

/// Errors raised while building or running the model.
///
/// Every variant aborts the single call in progress; nothing is retried and no
/// partial result is returned.
#[derive(Error, Debug)]
pub enum ModelError {
    /// `d_model` cannot be split evenly across the attention heads.
    #[error("model dimension {d_model} is not divisible by {num_heads} heads")]
    HeadMismatch { d_model: usize, num_heads: usize },

    /// A hyperparameter is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input sequence is longer than the positional table.
    #[error("sequence length {len} exceeds maximum length {max_len}")]
    SequenceTooLong { len: usize, max_len: usize },

    /// A tensor or id batch does not have the expected shape.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// A mask cannot be broadcast to `[batch, 1, len_q, len_k]`.
    #[error("mask of shape {shape:?} cannot broadcast to {target:?}")]
    MaskShape {
        shape: Vec<usize>,
        target: Vec<usize>,
    },

    /// A token id is not a row of the embedding table.
    #[error("token id {id} out of range for vocabulary of size {vocab_size}")]
    TokenOutOfRange { id: usize, vocab_size: usize },

    /// A surface token is absent from the vocabulary.
    #[error("unknown token {0:?}")]
    UnknownToken(String),

    /// An index has no surface form in the vocabulary.
    #[error("unknown token id {0}")]
    UnknownId(usize),

    /// Attention was asked to attend from queries over an empty key set.
    #[error("{len_q} attention queries have no keys to attend to")]
    NoKeys { len_q: usize },

    /// Nothing to translate.
    #[error("input sentence is empty")]
    EmptyInput,

    /// NaN or infinity reached the named stage, usually because a query row
    /// had every key masked.
    #[error("non-finite values in {0}")]
    NonFinite(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
