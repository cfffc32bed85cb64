//! Assembles the classifier input for one question pair.
//!
//! Column layout: `[q1 bag-of-words][q2 bag-of-words][manual features]`.
//! A model is only valid for vectors built with this exact layout.

use crate::features::{manual_features, FeatureConfig, MANUAL_FEATURES};
use crate::vocabulary::Vocabulary;

/// Width of every vector produced with `vocabulary`.
pub fn query_width(vocabulary: &Vocabulary) -> usize {
    2 * vocabulary.len() + MANUAL_FEATURES
}

/// Builds the feature vector for two cleaned questions.
pub fn query_point(q1: &str, q2: &str, vocabulary: &Vocabulary, config: &FeatureConfig) -> Vec<f64> {
    let mut point = Vec::with_capacity(query_width(vocabulary));
    point.extend(vocabulary.transform(q1));
    point.extend(vocabulary.transform(q2));
    point.extend(manual_features(q1, q2, config));
    point
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_NAMES;

    #[test]
    fn layout_is_q1_then_q2_then_manual() {
        let vocab = Vocabulary::fit(["learn python", "learn rust"], 10);
        let config = FeatureConfig::default();
        let point = query_point("learn python", "learn rust", &vocab, &config);

        assert_eq!(point.len(), query_width(&vocab));
        let n = vocab.len();
        assert_eq!(&point[..n], vocab.transform("learn python").as_slice());
        assert_eq!(&point[n..2 * n], vocab.transform("learn rust").as_slice());

        let manual = &point[2 * n..];
        assert_eq!(manual.len(), FEATURE_NAMES.len());
        // q1_len comes first
        assert_eq!(manual[0], 12.0);
    }

    #[test]
    fn empty_vocabulary_still_carries_manual_features() {
        let vocab = Vocabulary::from(Vec::<String>::new());
        let point = query_point("", "", &vocab, &FeatureConfig::default());
        assert_eq!(point.len(), MANUAL_FEATURES);
    }
}
