//! Serving path: raw question pair in, verdict out.

use std::path::Path;

use tracing::debug;

use crate::artifact::{self, ModelArtifact, VectorizerArtifact};
use crate::dto::Verdict;
use crate::error::Result;
use crate::forest::{Classifier, RandomForest};
use crate::preprocess::preprocess;
use crate::query_point::query_point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub verdict: Verdict,
    pub probability: f64,
}

/// Frozen vectorizer plus the model trained on its vectors. Read-only, so a
/// single instance can be shared across request handlers.
#[derive(Debug, Clone)]
pub struct Predictor {
    vectorizer: VectorizerArtifact,
    model: RandomForest,
}

impl Predictor {
    pub fn new(model: ModelArtifact, vectorizer: VectorizerArtifact) -> Self {
        Self {
            vectorizer,
            model: model.forest,
        }
    }

    pub fn load(model_path: impl AsRef<Path>, vectorizer_path: impl AsRef<Path>) -> Result<Self> {
        let (model, vectorizer) = artifact::load_pair(model_path, vectorizer_path)?;
        Ok(Self::new(model, vectorizer))
    }

    /// Feature vector for a raw pair, exactly as the model saw it in training.
    pub fn features(&self, question1: &str, question2: &str) -> Vec<f64> {
        let q1 = preprocess(question1);
        let q2 = preprocess(question2);
        query_point(&q1, &q2, &self.vectorizer.vocabulary, &self.vectorizer.features)
    }

    pub fn predict(&self, question1: &str, question2: &str) -> Result<Prediction> {
        let point = self.features(question1, question2);
        let probability = self.model.predict_proba(&point)?;
        let verdict = Verdict::from_label(u8::from(probability > 0.5));
        debug!(%verdict, probability, "pair classified");
        Ok(Prediction {
            verdict,
            probability,
        })
    }
}
