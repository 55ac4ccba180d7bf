use vanillaformer::{
    greedy_decode, translate, translate_iterative, Mask, Mode, ModelConfig, ModelError, Tensor,
    TransformerModel, Vocabulary,
};

fn hello_world() -> (Vocabulary, Vocabulary, TransformerModel) {
    let source = Vocabulary::from_pairs([("<pad", 0), ("hello", 1), ("world", 2)]).unwrap();
    let target = Vocabulary::from_pairs([("<pad", 0), ("bonjour", 1), ("monde", 2)]).unwrap();
    let model = TransformerModel::new(ModelConfig::tiny(3)).unwrap();
    (source, target, model)
}

fn repeat(word: &str, n: usize) -> String {
    vec![word; n].join(" ")
}

#[test]
fn hello_world_translates_into_target_words() {
    let (source, target, model) = hello_world();
    let out = translate("hello world", &source, &target, &model).unwrap();
    let words: Vec<&str> = out.split_whitespace().collect();
    assert!(words.len() <= 2);
    for w in words {
        assert!(w == "bonjour" || w == "monde", "unexpected word {w:?}");
    }
}

#[test]
fn input_of_exactly_max_len_is_accepted() {
    let (source, target, model) = hello_world();
    let max_len = model.config().max_len;
    assert!(translate(&repeat("hello", max_len), &source, &target, &model).is_ok());
}

#[test]
fn input_longer_than_max_len_fails_fast() {
    let (source, target, model) = hello_world();
    let max_len = model.config().max_len;
    let err = translate(&repeat("world", max_len + 1), &source, &target, &model).unwrap_err();
    assert!(matches!(err, ModelError::SequenceTooLong { len, max_len: m } if len == m + 1));
}

#[test]
fn forward_is_deterministic_in_inference_mode() {
    let (_, _, model) = hello_world();
    let src = vec![vec![1, 2, 1]];
    let tgt = vec![vec![0, 1, 2]];
    let mask = Mask::causal(3);
    let a = model.forward(&src, &tgt, Some(&mask), &mut Mode::Inference).unwrap();
    let b = model.forward(&src, &tgt, Some(&mask), &mut Mode::Inference).unwrap();
    assert_eq!(a, b);

    let rebuilt = TransformerModel::new(ModelConfig::tiny(3)).unwrap();
    let c = rebuilt.forward(&src, &tgt, Some(&mask), &mut Mode::Inference).unwrap();
    assert_eq!(a, c);
}

#[test]
fn causal_mask_hides_later_target_tokens() {
    let (_, _, model) = hello_world();
    let src = vec![vec![1, 2]];
    let mask = Mask::causal(3);
    let a = model
        .forward(&src, &[vec![1, 2, 1]], Some(&mask), &mut Mode::Inference)
        .unwrap();
    let b = model
        .forward(&src, &[vec![1, 2, 2]], Some(&mask), &mut Mode::Inference)
        .unwrap();
    let vocab = a.last_dim();
    for i in 0..2 * vocab {
        assert!((a.data[i] - b.data[i]).abs() < 1e-5);
    }
}

#[test]
fn missing_mask_lets_earlier_positions_see_later_tokens() {
    let (_, _, model) = hello_world();
    let src = vec![vec![1, 2]];
    let a = model
        .forward(&src, &[vec![1, 2, 1]], None, &mut Mode::Inference)
        .unwrap();
    let b = model
        .forward(&src, &[vec![1, 2, 2]], None, &mut Mode::Inference)
        .unwrap();
    assert_ne!(&a.data[..3], &b.data[..3]);
}

#[test]
fn fully_masked_row_surfaces_as_non_finite_output() {
    let (_, _, model) = hello_world();
    let mask = Mask::from_tensor(Tensor::new(vec![0.0, 0.0, 1.0, 1.0], vec![2, 2])).unwrap();
    let logits = model
        .forward(&[vec![1, 2]], &[vec![0, 0]], Some(&mask), &mut Mode::Inference)
        .unwrap();
    assert!(!logits.is_finite());
}

#[test]
fn batched_forward_matches_single_examples() {
    let (_, _, model) = hello_world();
    let mask = Mask::causal(2);
    let batched = model
        .forward(
            &[vec![1, 2], vec![2, 2]],
            &[vec![0, 0], vec![1, 0]],
            Some(&mask),
            &mut Mode::Inference,
        )
        .unwrap();
    let second = model
        .forward(&[vec![2, 2]], &[vec![1, 0]], Some(&mask), &mut Mode::Inference)
        .unwrap();
    assert_eq!(batched.shape, vec![2, 2, 3]);
    for (a, b) in batched.data[6..].iter().zip(&second.data) {
        assert!((a - b).abs() < 1e-5);
    }
}

#[test]
fn ragged_batches_are_rejected() {
    let (_, _, model) = hello_world();
    let err = model
        .forward(&[vec![1, 2], vec![1]], &[vec![0], vec![0]], None, &mut Mode::Inference)
        .unwrap_err();
    assert!(matches!(err, ModelError::ShapeMismatch { .. }));
}

#[test]
fn iterative_decode_uses_french_table() {
    let source = Vocabulary::english();
    let target = Vocabulary::french();
    let model = TransformerModel::new(ModelConfig {
        vocab_size: target.len(),
        seed: Some(1),
        ..ModelConfig::tiny(target.len())
    })
    .unwrap();
    let out = translate_iterative("I am happy .", &source, &target, &model, 5).unwrap();
    assert!(out.split_whitespace().count() <= 5);

    let src = source.encode("I am happy .").unwrap();
    let ids = greedy_decode(&model, &src, 1, 2, 5).unwrap();
    assert!(ids.len() <= 5);
    assert!(!ids.contains(&2));
}

#[test]
fn one_shot_on_builtin_tables() {
    let source = Vocabulary::english();
    let target = Vocabulary::french();
    let model = TransformerModel::new(ModelConfig {
        vocab_size: target.len(),
        ..ModelConfig::tiny(target.len())
    })
    .unwrap();
    let out = translate("I am happy .", &source, &target, &model).unwrap();
    assert!(out.split_whitespace().count() <= 4);
}
