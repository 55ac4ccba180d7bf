//! Turning model logits into target sentences.
//!
//! Two procedures are offered and kept deliberately distinct:
//!
//! * [`translate`] runs one forward pass over a pad-filled target buffer as
//!   long as the input and takes the per-position arg-max. Every position
//!   is predicted from the same pad context, so the output never depends on
//!   earlier predictions.
//! * [`greedy_decode`] is the autoregressive loop: it feeds each prediction
//!   back in, rebuilding the causal mask every step, until the end token or
//!   the step cap.

use crate::error::{ModelError, Result};
use crate::layers::Mode;
use crate::mask::Mask;
use crate::math;
use crate::models::TransformerModel;
use crate::tensor::Tensor;
use crate::util::logging;
use crate::vocab::Vocabulary;

/// One-shot fixed-length translation of a whitespace-tokenized sentence.
///
/// The arg-max only considers indices that exist in `target`.
pub fn translate(
    sentence: &str,
    source: &Vocabulary,
    target: &Vocabulary,
    model: &TransformerModel,
) -> Result<String> {
    let src = source.encode(sentence)?;
    if src.is_empty() {
        return Err(ModelError::EmptyInput);
    }
    let len = src.len();
    let tgt_mask = Mask::causal(len);
    let tgt = vec![target.pad_id().unwrap_or(0); len];

    let logits = model.forward(&[src], &[tgt], Some(&tgt_mask), &mut Mode::Inference)?;
    let probs = Tensor::softmax(&logits);
    if !probs.is_finite() {
        return Err(ModelError::NonFinite("output probabilities"));
    }
    let predicted = probs.argmax_last(target.len());
    target.decode(&predicted)
}

/// Autoregressive greedy decoding of a single source sequence.
///
/// Starts from `[sos]` and appends the arg-max of the last position each
/// step. Stops when `eos` is produced or after `max_steps` tokens, where
/// `max_steps` is further capped by the model's `max_len`. The returned ids
/// exclude both `sos` and `eos`.
pub fn greedy_decode(
    model: &TransformerModel,
    src_ids: &[usize],
    sos: usize,
    eos: usize,
    max_steps: usize,
) -> Result<Vec<usize>> {
    if src_ids.is_empty() {
        return Err(ModelError::EmptyInput);
    }
    let src = [src_ids.to_vec()];
    let mut mode = Mode::Inference;
    let src_mask = model.source_mask(&src)?;
    let memory = model.encode(&src, src_mask.as_ref(), &mut mode)?;

    let steps = max_steps.min(model.config().max_len);
    let mut tgt = vec![sos];
    let mut out = Vec::new();
    for step in 0..steps {
        let mask = Mask::causal(tgt.len());
        let logits = model.decode(&[tgt.clone()], &memory, Some(&mask), &mut mode)?;
        if !logits.is_finite() {
            return Err(ModelError::NonFinite("decoder logits"));
        }
        let vocab = logits.last_dim();
        let last = &logits.data[(tgt.len() - 1) * vocab..];
        let next = math::argmax(last);
        logging::log_decode_step(step, next);
        if next == eos {
            return Ok(out);
        }
        out.push(next);
        tgt.push(next);
    }
    logging::log_decode_truncated(steps);
    Ok(out)
}

/// Iterative counterpart of [`translate`]. `target` must define `<sos` and
/// `<eos`, and the model's vocabulary must not be larger than `target`.
pub fn translate_iterative(
    sentence: &str,
    source: &Vocabulary,
    target: &Vocabulary,
    model: &TransformerModel,
    max_steps: usize,
) -> Result<String> {
    let src = source.encode(sentence)?;
    if src.is_empty() {
        return Err(ModelError::EmptyInput);
    }
    let (sos, eos) = match (target.sos_id(), target.eos_id()) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            return Err(ModelError::InvalidConfig(
                "target vocabulary needs start and end tokens".into(),
            ))
        }
    };
    let ids = greedy_decode(model, &src, sos, eos, max_steps)?;
    target.decode(&ids)
}

/// Which decoding procedure a [`Translator`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    #[default]
    OneShot,
    Iterative { max_steps: usize },
}

/// A model bundled with its source and target vocabularies.
pub struct Translator {
    model: TransformerModel,
    source: Vocabulary,
    target: Vocabulary,
    mode: DecodeMode,
}

impl Translator {
    pub fn new(model: TransformerModel, source: Vocabulary, target: Vocabulary) -> Self {
        Self {
            model,
            source,
            target,
            mode: DecodeMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    pub fn model(&self) -> &TransformerModel {
        &self.model
    }

    pub fn translate(&self, sentence: &str) -> Result<String> {
        let out = match self.mode {
            DecodeMode::OneShot => translate(sentence, &self.source, &self.target, &self.model),
            DecodeMode::Iterative { max_steps } => translate_iterative(
                sentence,
                &self.source,
                &self.target,
                &self.model,
                max_steps,
            ),
        }?;
        logging::log_translation(sentence, &out);
        Ok(out)
    }
}
