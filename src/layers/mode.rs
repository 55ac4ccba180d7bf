use rand::rngs::StdRng;

use crate::rng::seeded_rng;

/// Whether dropout is active.
///
/// The mode is threaded explicitly as `&mut Mode` through every forward call
/// that can reach a [`super::Dropout`]; there is no global training flag.
/// In [`Mode::Inference`] the whole forward pass is a pure function of its
/// inputs and the model parameters.
pub enum Mode {
    Inference,
    /// Dropout masks are drawn from the carried generator.
    Train(StdRng),
}

impl Mode {
    /// Training mode with a reproducible dropout stream.
    pub fn train(seed: Option<u64>) -> Self {
        Mode::Train(seeded_rng(seed))
    }

    pub fn is_training(&self) -> bool {
        matches!(self, Mode::Train(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_train_mode_is_training() {
        assert!(!Mode::Inference.is_training());
        assert!(Mode::train(Some(0)).is_training());
    }
}
