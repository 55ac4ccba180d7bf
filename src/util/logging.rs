use log::{debug, info, warn};

use crate::config::ModelConfig;

/// One-line description of a freshly built model.
pub fn format_model_summary(cfg: &ModelConfig, num_parameters: usize) -> String {
    format!(
        "Transformer: d_model={} heads={} ffn={} layers={}+{} vocab={} max_len={} params={}",
        cfg.d_model,
        cfg.num_heads,
        cfg.ffn_hidden,
        cfg.num_encoder_layers,
        cfg.num_decoder_layers,
        cfg.vocab_size,
        cfg.max_len,
        num_parameters
    )
}

/// Log the model summary at debug level.
pub fn log_model_summary(cfg: &ModelConfig, num_parameters: usize) {
    debug!("{}", format_model_summary(cfg, num_parameters));
}

/// Format an input/output sentence pair.
pub fn format_translation(input: &str, output: &str) -> String {
    format!("{:?} -> {:?}", input, output)
}

/// Log a completed translation at info level.
pub fn log_translation(input: &str, output: &str) {
    info!("{}", format_translation(input, output));
}

/// Log one iterative decoding step at debug level.
pub fn log_decode_step(step: usize, token: usize) {
    debug!("decode step {}: token {}", step, token);
}

/// Warn that greedy decoding ran out of steps before emitting `eos`.
pub fn log_decode_truncated(max_steps: usize) {
    warn!("greedy decode stopped after {} steps without end token", max_steps);
}
