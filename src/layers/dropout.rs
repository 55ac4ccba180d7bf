use rand::Rng;

use super::layer::{Layer, Parameterised};
use super::mode::Mode;
use crate::error::Result;
use crate::tensor::Tensor;

/// Dropout layer that randomly zeros elements during training.
///
/// In [`Mode::Train`] each element is kept with probability `1 - p` and
/// scaled by `1/(1 - p)` to preserve the expected activation ("inverted"
/// dropout). In [`Mode::Inference`] the input is returned unchanged.
pub struct Dropout {
    p: f32,
}

impl Dropout {
    pub fn new(p: f32) -> Self {
        Self { p }
    }

    pub fn p(&self) -> f32 {
        self.p
    }

    pub fn forward(&self, x: &Tensor, mode: &mut Mode) -> Tensor {
        match mode {
            Mode::Inference => x.clone(),
            Mode::Train(rng) => {
                let scale = if self.p < 1.0 { 1.0 / (1.0 - self.p) } else { 0.0 };
                let mut out = x.clone();
                for v in out.data.iter_mut() {
                    if rng.gen::<f32>() < self.p {
                        *v = 0.0;
                    } else {
                        *v *= scale;
                    }
                }
                out
            }
        }
    }
}

impl Parameterised for Dropout {
    fn num_parameters(&self) -> usize {
        0
    }
}

impl Layer for Dropout {
    fn forward(&self, x: &Tensor, mode: &mut Mode) -> Result<Tensor> {
        Ok(Dropout::forward(self, x, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_is_identity() {
        let d = Dropout::new(0.9);
        let x = Tensor::new(vec![1.0, -2.0, 3.0], vec![3]);
        assert_eq!(d.forward(&x, &mut Mode::Inference), x);
    }

    #[test]
    fn train_zeroes_or_rescales() {
        let d = Dropout::new(0.5);
        assert_eq!(d.p(), 0.5);
        let x = Tensor::new(vec![1.0; 256], vec![256]);
        let y = d.forward(&x, &mut Mode::train(Some(11)));
        assert!(y.data.iter().all(|&v| v == 0.0 || (v - 2.0).abs() < 1e-6));
        let dropped = y.data.iter().filter(|&&v| v == 0.0).count();
        assert!(dropped > 64 && dropped < 192, "dropped {dropped}");
    }

    #[test]
    fn zero_probability_keeps_everything_in_training() {
        let d = Dropout::new(0.0);
        let x = Tensor::new(vec![0.5, 1.5], vec![2]);
        assert_eq!(d.forward(&x, &mut Mode::train(Some(1))), x);
    }
}
