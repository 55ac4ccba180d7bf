use proptest::prelude::*;
use vanillaformer::positional::{positional_encoding, PositionalEncoding, FREQUENCY_BASE};
use vanillaformer::tensor::Tensor;
use vanillaformer::ModelError;

fn closed_form(pos: usize, channel: usize, d_model: usize) -> f32 {
    let i = channel / 2;
    let angle = pos as f32 / FREQUENCY_BASE.powf((2 * i) as f32 / d_model as f32);
    if channel % 2 == 0 {
        angle.sin()
    } else {
        angle.cos()
    }
}

#[test]
fn table_shape_matches_construction() {
    let pe = PositionalEncoding::new(16, 50);
    assert_eq!(pe.max_len(), 50);
    assert_eq!(pe.d_model(), 16);
    assert_eq!((pe.table().rows, pe.table().cols), (50, 16));
}

#[test]
fn frequencies_decrease_across_channels() {
    // at pos 1 the sine argument shrinks as the channel index grows
    let m = positional_encoding(2, 8);
    let s: Vec<f32> = (0..4).map(|i| m.get(1, 2 * i)).collect();
    for w in s.windows(2) {
        assert!(w[0] > w[1]);
    }
}

#[test]
fn broadcasting_over_batch_leaves_examples_independent() {
    let pe = PositionalEncoding::new(4, 8);
    let mut x = Tensor::zeros(vec![2, 3, 4]);
    x.set(&[1, 0, 0], 10.0);
    let y = pe.apply(&x).unwrap();
    assert_eq!(y.get(&[0, 0, 0]), 0.0);
    assert_eq!(y.get(&[1, 0, 0]), 10.0);
    assert_eq!(y.get(&[0, 2, 1]), y.get(&[1, 2, 1]));
}

#[test]
fn too_long_sequence_is_rejected() {
    let pe = PositionalEncoding::new(4, 2);
    let err = pe.apply(&Tensor::zeros(vec![1, 3, 4])).unwrap_err();
    assert!(matches!(err, ModelError::SequenceTooLong { len: 3, max_len: 2 }));
}

#[test]
fn wrong_model_dim_is_rejected() {
    let pe = PositionalEncoding::new(4, 2);
    assert!(matches!(
        pe.apply(&Tensor::zeros(vec![1, 2, 6])),
        Err(ModelError::ShapeMismatch { .. })
    ));
}

proptest! {
    #[test]
    fn table_matches_closed_form(half in 1usize..17, max_len in 1usize..64) {
        let d_model = half * 2;
        let pe = PositionalEncoding::new(d_model, max_len);
        for pos in 0..max_len {
            for c in 0..d_model {
                let want = closed_form(pos, c, d_model);
                prop_assert!((pe.table().get(pos, c) - want).abs() < 1e-6);
            }
        }
    }
}
