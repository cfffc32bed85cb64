//! On-disk model and vectorizer artifacts.
//!
//! Both are JSON documents tagged with [`FORMAT_VERSION`]. The vectorizer
//! carries the feature settings alongside the vocabulary, so a model can only
//! be served with the configuration it was trained with.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, Result};
use crate::features::FeatureConfig;
use crate::forest::RandomForest;
use crate::query_point::query_width;
use crate::vocabulary::Vocabulary;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub forest: RandomForest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    pub format_version: u32,
    pub vocabulary: Vocabulary,
    pub features: FeatureConfig,
}

impl ModelArtifact {
    pub fn new(forest: RandomForest) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            forest,
        }
    }
}

impl VectorizerArtifact {
    pub fn new(vocabulary: Vocabulary, features: FeatureConfig) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            vocabulary,
            features,
        }
    }

    /// Count vector for one cleaned question.
    pub fn transform(&self, cleaned: &str) -> Vec<f64> {
        self.vocabulary.transform(cleaned)
    }
}

pub fn save<T: Serialize>(artifact: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_vec(artifact)?;
    fs::write(path, json)?;
    info!(path = %path.display(), "artifact written");
    Ok(())
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| AppError::artifact(path, format!("cannot read: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::artifact(path, format!("corrupt: {e}")))
}

fn check_version(path: &Path, found: u32) -> Result<()> {
    if found != FORMAT_VERSION {
        return Err(AppError::artifact(
            path,
            format!("format version {found}, expected {FORMAT_VERSION}"),
        ));
    }
    Ok(())
}

/// Loads both artifacts and checks that the model was trained on vectors of
/// the width this vectorizer produces.
pub fn load_pair(
    model_path: impl AsRef<Path>,
    vectorizer_path: impl AsRef<Path>,
) -> Result<(ModelArtifact, VectorizerArtifact)> {
    let (model_path, vectorizer_path) = (model_path.as_ref(), vectorizer_path.as_ref());

    let model: ModelArtifact = load(model_path)?;
    check_version(model_path, model.format_version)?;
    let vectorizer: VectorizerArtifact = load(vectorizer_path)?;
    check_version(vectorizer_path, vectorizer.format_version)?;

    let expected = query_width(&vectorizer.vocabulary);
    if model.forest.n_features() != expected {
        return Err(AppError::DimensionMismatch {
            expected,
            actual: model.forest.n_features(),
        });
    }

    info!(
        model = %model_path.display(),
        vectorizer = %vectorizer_path.display(),
        vocabulary = vectorizer.vocabulary.len(),
        trees = model.forest.n_trees(),
        max_depth = ?model.forest.params().max_depth,
        random_state = model.forest.params().random_state,
        "artifacts loaded"
    );
    Ok((model, vectorizer))
}
