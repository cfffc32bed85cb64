//! Batch training: CSV in, model and vectorizer artifacts out.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::artifact::{self, ModelArtifact, VectorizerArtifact};
use crate::config::{Settings, VocabularySource};
use crate::dataset::{train_test_split, Dataset};
use crate::error::{AppError, Result};
use crate::features::FeatureConfig;
use crate::forest::{ForestParams, Matrix, RandomForest};
use crate::preprocess::preprocess;
use crate::query_point::query_point;
use crate::vocabulary::Vocabulary;

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub rows_used: usize,
    pub rows_dropped: usize,
    pub vocabulary_size: usize,
    pub feature_width: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_accuracy: f64,
    pub test_accuracy: Option<f64>,
}

/// Options for [`fit`], independent of where the data comes from.
#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub sample_size: usize,
    pub random_state: u64,
    pub test_fraction: f64,
    pub max_features: usize,
    pub vocabulary_source: VocabularySource,
    pub features: FeatureConfig,
    pub forest: ForestParams,
}

impl From<&Settings> for TrainingOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            sample_size: settings.sample_size,
            random_state: settings.random_state,
            test_fraction: settings.test_fraction,
            max_features: settings.max_features,
            vocabulary_source: settings.vocabulary_source,
            features: settings.feature_config(),
            forest: settings.forest_params(),
        }
    }
}

/// Share of positions where `predicted` equals `truth`.
pub fn accuracy(predicted: &[u8], truth: &[u8]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    hits as f64 / truth.len() as f64
}

/// Fits the vocabulary and the forest on an in-memory dataset.
pub fn fit(
    dataset: Dataset,
    options: &TrainingOptions,
) -> Result<(ModelArtifact, VectorizerArtifact, TrainingReport)> {
    let rows_dropped = dataset.dropped;
    let dataset = dataset.sample(options.sample_size, options.random_state);
    if dataset.is_empty() {
        return Err(AppError::EmptyDataset("no usable question pairs".into()));
    }

    let cleaned: Vec<(String, String)> = dataset
        .pairs
        .par_iter()
        .map(|p| (preprocess(&p.question1), preprocess(&p.question2)))
        .collect();
    let labels: Vec<u8> = dataset.pairs.iter().map(|p| p.is_duplicate).collect();

    let vocabulary = match options.vocabulary_source {
        VocabularySource::Question1 => {
            Vocabulary::fit(cleaned.iter().map(|(q1, _)| q1), options.max_features)
        }
        VocabularySource::Both => Vocabulary::fit(
            cleaned.iter().flat_map(|(q1, q2)| [q1, q2]),
            options.max_features,
        ),
    };
    info!(terms = vocabulary.len(), "vocabulary built");

    let rows: Vec<Vec<f64>> = cleaned
        .par_iter()
        .map(|(q1, q2)| query_point(q1, q2, &vocabulary, &options.features))
        .collect();
    let x = Matrix::from_rows(&rows)?;
    drop(rows);
    let (_, feature_width) = x.shape();
    info!(rows = labels.len(), feature_width, "feature matrix assembled");

    let (train_idx, test_idx) =
        train_test_split(labels.len(), options.test_fraction, options.random_state)?;
    let select = |idx: &[usize]| -> Result<(Matrix, Vec<u8>)> {
        let rows: Vec<Vec<f64>> = idx
            .iter()
            .map(|&i| x.row(i).iter().map(|&v| f64::from(v)).collect())
            .collect();
        Ok((Matrix::from_rows(&rows)?, idx.iter().map(|&i| labels[i]).collect()))
    };
    let (x_train, y_train) = select(&train_idx)?;

    let forest = RandomForest::fit(&x_train, &y_train, options.forest.clone())?;
    let train_accuracy = accuracy(&forest.predict_matrix(&x_train)?, &y_train);
    drop(x_train);

    let test_accuracy = if test_idx.is_empty() {
        None
    } else {
        let (x_test, y_test) = select(&test_idx)?;
        Some(accuracy(&forest.predict_matrix(&x_test)?, &y_test))
    };
    info!(train_accuracy, ?test_accuracy, "forest evaluated");

    let report = TrainingReport {
        rows_used: labels.len(),
        rows_dropped,
        vocabulary_size: vocabulary.len(),
        feature_width,
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
        train_accuracy,
        test_accuracy,
    };
    Ok((
        ModelArtifact::new(forest),
        VectorizerArtifact::new(vocabulary, options.features.clone()),
        report,
    ))
}

/// Reads the CSV named in `settings`, trains, and writes both artifacts.
pub fn train(settings: &Settings) -> Result<TrainingReport> {
    let dataset = Dataset::from_csv_path(&settings.data_path)?;
    let (model, vectorizer, report) = fit(dataset, &TrainingOptions::from(settings))?;
    artifact::save(&model, &settings.model_path)?;
    artifact::save(&vectorizer, &settings.vectorizer_path)?;
    Ok(report)
}
