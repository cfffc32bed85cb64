//! Hand-engineered features computed on a pair of cleaned questions.
//!
//! Each extractor is a pure function returning a fixed-size array. The order
//! of [`FEATURE_NAMES`] is the column order the classifier was trained on.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::fuzzy;
use crate::preprocess::tokens;
use crate::sequence::longest_match_len;

pub const LEXICAL_FEATURES: usize = 7;
pub const TOKEN_FEATURES: usize = 8;
pub const LENGTH_FEATURES: usize = 3;
pub const FUZZY_FEATURES: usize = 4;
pub const MANUAL_FEATURES: usize =
    LEXICAL_FEATURES + TOKEN_FEATURES + LENGTH_FEATURES + FUZZY_FEATURES;

pub const FEATURE_NAMES: [&str; MANUAL_FEATURES] = [
    "q1_len",
    "q2_len",
    "q1_num_words",
    "q2_num_words",
    "word_common",
    "word_total",
    "word_share",
    "cwc_min",
    "cwc_max",
    "csc_min",
    "csc_max",
    "ctc_min",
    "ctc_max",
    "last_word_eq",
    "first_word_eq",
    "mean_len",
    "abs_len_diff",
    "longest_substr_ratio",
    "fuzz_ratio",
    "fuzz_partial_ratio",
    "token_sort_ratio",
    "token_set_ratio",
];

pub const DEFAULT_STOPWORDS: &[&str] = &["the", "is", "in", "on", "at", "to", "a", "an", "of"];
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// Settings the token-class features depend on. Persisted with the
/// vocabulary so a model is always served with the values it was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub stopwords: BTreeSet<String>,
    pub epsilon: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            stopwords: DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl FeatureConfig {
    pub fn new(stopwords: impl IntoIterator<Item = String>, epsilon: f64) -> Self {
        Self {
            stopwords: stopwords.into_iter().collect(),
            epsilon,
        }
    }

    fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }
}

/// Rounds to two decimals on the exact binary value, so 1/40 (stored just
/// above 0.025) gives 0.03 while an exact 0.125 tie goes to 0.12.
fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Lengths, word counts and word overlap.
///
/// `[q1_len, q2_len, q1_num_words, q2_num_words, word_common, word_total, word_share]`
pub fn lexical_features(q1: &str, q2: &str) -> [f64; LEXICAL_FEATURES] {
    let q1_words = tokens(q1);
    let q2_words = tokens(q2);

    let w1: HashSet<String> = q1_words.iter().map(|w| w.trim().to_lowercase()).collect();
    let w2: HashSet<String> = q2_words.iter().map(|w| w.trim().to_lowercase()).collect();

    let word_common = w1.intersection(&w2).count();
    let word_total = w1.len() + w2.len();
    let word_share = if word_total > 0 {
        round2(word_common as f64 / word_total as f64)
    } else {
        0.0
    };

    [
        q1.chars().count() as f64,
        q2.chars().count() as f64,
        q1_words.len() as f64,
        q2_words.len() as f64,
        word_common as f64,
        word_total as f64,
        word_share,
    ]
}

/// Stopword / content-word overlap ratios and boundary-token flags.
///
/// All zeros when either question has no tokens.
pub fn token_features(q1: &str, q2: &str, config: &FeatureConfig) -> [f64; TOKEN_FEATURES] {
    let mut features = [0.0; TOKEN_FEATURES];

    let q1_tokens = tokens(q1);
    let q2_tokens = tokens(q2);
    let (Some(q1_first), Some(q2_first)) = (q1_tokens.first(), q2_tokens.first()) else {
        return features;
    };
    let (Some(q1_last), Some(q2_last)) = (q1_tokens.last(), q2_tokens.last()) else {
        return features;
    };

    let (q1_stops, q1_words): (HashSet<&str>, HashSet<&str>) =
        partition(&q1_tokens, |t| config.is_stopword(t));
    let (q2_stops, q2_words): (HashSet<&str>, HashSet<&str>) =
        partition(&q2_tokens, |t| config.is_stopword(t));

    let common_words = q1_words.intersection(&q2_words).count() as f64;
    let common_stops = q1_stops.intersection(&q2_stops).count() as f64;
    let q1_set: HashSet<&str> = q1_tokens.iter().copied().collect();
    let q2_set: HashSet<&str> = q2_tokens.iter().copied().collect();
    let common_tokens = q1_set.intersection(&q2_set).count() as f64;

    let eps = config.epsilon;
    let ratio_pair = |common: f64, a: usize, b: usize| {
        (
            common / (a.min(b) as f64 + eps),
            common / (a.max(b) as f64 + eps),
        )
    };

    (features[0], features[1]) = ratio_pair(common_words, q1_words.len(), q2_words.len());
    (features[2], features[3]) = ratio_pair(common_stops, q1_stops.len(), q2_stops.len());
    (features[4], features[5]) = ratio_pair(common_tokens, q1_tokens.len(), q2_tokens.len());
    features[6] = f64::from(u8::from(q1_last == q2_last));
    features[7] = f64::from(u8::from(q1_first == q2_first));

    features
}

fn partition<'a>(
    tokens: &[&'a str],
    is_stop: impl Fn(&str) -> bool,
) -> (HashSet<&'a str>, HashSet<&'a str>) {
    tokens.iter().copied().partition(|t| is_stop(t))
}

/// Token-count statistics and the longest common substring ratio.
///
/// `[mean_len, abs_len_diff, longest_substr_ratio]`
pub fn length_features(q1: &str, q2: &str) -> [f64; LENGTH_FEATURES] {
    let n1 = tokens(q1).len();
    let n2 = tokens(q2).len();

    let a: Vec<char> = q1.chars().collect();
    let b: Vec<char> = q2.chars().collect();
    let shorter = a.len().min(b.len());
    let longest_substr_ratio = if shorter > 0 {
        longest_match_len(&a, &b) as f64 / shorter as f64
    } else {
        0.0
    };

    [
        (n1 + n2) as f64 / 2.0,
        n1.abs_diff(n2) as f64,
        longest_substr_ratio,
    ]
}

/// `[fuzz_ratio, fuzz_partial_ratio, token_sort_ratio, token_set_ratio]`
pub fn fuzzy_features(q1: &str, q2: &str) -> [f64; FUZZY_FEATURES] {
    [
        fuzzy::qratio(q1, q2),
        fuzzy::partial_ratio(q1, q2),
        fuzzy::token_sort_ratio(q1, q2),
        fuzzy::token_set_ratio(q1, q2),
    ]
}

/// All 22 manual features in column order.
pub fn manual_features(q1: &str, q2: &str, config: &FeatureConfig) -> Vec<f64> {
    let mut features = Vec::with_capacity(MANUAL_FEATURES);
    features.extend(lexical_features(q1, q2));
    features.extend(token_features(q1, q2, config));
    features.extend(length_features(q1, q2));
    features.extend(fuzzy_features(q1, q2));
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn lexical_counts_words_and_overlap() {
        let f = lexical_features("how do i learn python", "what is the best way to learn python");
        assert_eq!(f[0], 21.0);
        assert_eq!(f[1], 36.0);
        assert_eq!(f[2], 5.0);
        assert_eq!(f[3], 8.0);
        assert_eq!(f[4], 2.0);
        assert_eq!(f[5], 13.0);
        assert_eq!(f[6], 0.15);
    }

    #[test]
    fn lexical_word_share_rounds_half_to_even() {
        // 1 shared word over 8 distinct words is exactly 0.125
        let f = lexical_features("a b c d", "a e f g");
        assert_eq!(f[4], 1.0);
        assert_eq!(f[5], 8.0);
        assert_eq!(f[6], 0.12);
    }

    #[test]
    fn lexical_word_share_rounds_stored_value() {
        let q1: Vec<String> = (0..19).map(|i| format!("a{i}")).chain(["x".into()]).collect();
        let q2: Vec<String> = (0..19).map(|i| format!("b{i}")).chain(["x".into()]).collect();
        let f = lexical_features(&q1.join(" "), &q2.join(" "));
        assert_eq!(f[4], 1.0);
        assert_eq!(f[5], 40.0);
        assert_eq!(f[6], 0.03);
        assert_eq!(round2(3.0 / 40.0), 0.08);
        assert_eq!(round2(7.0 / 40.0), 0.18);
    }

    #[test]
    fn lexical_handles_empty_pair() {
        let f = lexical_features("", "");
        assert_eq!(f, [0.0; LEXICAL_FEATURES]);
    }

    #[test]
    fn token_features_zero_when_a_side_is_empty() {
        let config = FeatureConfig::default();
        assert_eq!(token_features("", "test", &config), [0.0; TOKEN_FEATURES]);
        assert_eq!(token_features("test", "", &config), [0.0; TOKEN_FEATURES]);
        assert_eq!(token_features("", "", &config), [0.0; TOKEN_FEATURES]);
    }

    #[test]
    fn token_features_ratios() {
        let config = FeatureConfig::default();
        let f = token_features(
            "how do i learn python",
            "what is the best way to learn python",
            &config,
        );
        // content words: {how, do, i, learn, python} vs {what, best, way, learn, python}
        assert!((f[0] - 2.0 / (5.0 + 1e-4)).abs() < EPS);
        assert!((f[1] - 2.0 / (5.0 + 1e-4)).abs() < EPS);
        // stopwords: {} vs {is, the, to}
        assert_eq!(f[2], 0.0);
        assert_eq!(f[3], 0.0);
        assert!((f[4] - 2.0 / (5.0 + 1e-4)).abs() < EPS);
        assert!((f[5] - 2.0 / (8.0 + 1e-4)).abs() < EPS);
        assert_eq!(f[6], 1.0);
        assert_eq!(f[7], 0.0);
    }

    #[test]
    fn token_features_follow_configured_stopwords() {
        let config = FeatureConfig::new(vec!["learn".to_string()], 1.0);
        let f = token_features("learn rust", "learn go", &config);
        assert_eq!(f[0], 0.0);
        assert_eq!(f[2], 0.5);
        assert_eq!(f[7], 1.0);
    }

    #[test]
    fn length_features_ratio_uses_characters() {
        let f = length_features("abcd", "xxabcdyy");
        assert_eq!(f[0], 1.0);
        assert_eq!(f[1], 0.0);
        assert_eq!(f[2], 1.0);

        let f = length_features("one two three", "one");
        assert_eq!(f[0], 2.0);
        assert_eq!(f[1], 2.0);
        assert_eq!(f[2], 1.0);
    }

    #[test]
    fn length_features_guard_empty() {
        assert_eq!(length_features("", "abc"), [0.5, 1.0, 0.0]);
        assert_eq!(length_features("", ""), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn manual_features_have_fixed_width() {
        let config = FeatureConfig::default();
        assert_eq!(manual_features("", "", &config).len(), MANUAL_FEATURES);
        assert_eq!(manual_features("a b", "c", &config).len(), FEATURE_NAMES.len());
    }
}
