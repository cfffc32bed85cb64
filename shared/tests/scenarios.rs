use shared::features::{
    fuzzy_features, lexical_features, token_features, FeatureConfig, TOKEN_FEATURES,
};
use shared::preprocess::preprocess;

#[test]
fn python_questions_share_last_token() {
    let q1 = preprocess("How do I learn Python?");
    let q2 = preprocess("What is the best way to learn Python?");
    assert_eq!(q1, "how do i learn python");
    assert_eq!(q2, "what is the best way to learn python");

    let f = token_features(&q1, &q2, &FeatureConfig::default());
    assert_eq!(f[6], 1.0, "last_word_eq");
    assert_eq!(f[7], 0.0, "first_word_eq");
}

#[test]
fn empty_question_against_word() {
    let q1 = preprocess("");
    let q2 = preprocess("test");
    assert_eq!(q1, "");

    assert_eq!(token_features(&q1, &q2, &FeatureConfig::default()), [0.0; TOKEN_FEATURES]);
    assert_eq!(lexical_features(&q1, &q2)[6], 0.0);
}

#[test]
fn identical_questions_score_maximum() {
    let q = preprocess("What is the best way to learn Rust?");

    assert_eq!(fuzzy_features(&q, &q), [100.0; 4]);

    let f = token_features(&q, &q, &FeatureConfig::default());
    for (name, value) in [
        ("cwc_min", f[0]),
        ("cwc_max", f[1]),
        ("csc_min", f[2]),
        ("csc_max", f[3]),
        ("ctc_min", f[4]),
        ("ctc_max", f[5]),
    ] {
        assert!((value - 1.0).abs() < 1e-3, "{name} = {value}");
    }
    assert_eq!(f[6], 1.0);
    assert_eq!(f[7], 1.0);
}
