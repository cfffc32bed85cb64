use serde::Deserialize;

use crate::features::{FeatureConfig, DEFAULT_EPSILON, DEFAULT_STOPWORDS};
use crate::forest::{ForestParams, MaxFeatures};
use crate::vocabulary::DEFAULT_MAX_FEATURES;

fn default_data_path() -> String {
    "train.csv".into()
}

fn default_model_path() -> String {
    "model.json".into()
}

fn default_vectorizer_path() -> String {
    "vectorizer.json".into()
}

fn default_sample_size() -> usize {
    30_000
}

fn default_random_state() -> u64 {
    42
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_max_features() -> usize {
    DEFAULT_MAX_FEATURES
}

fn default_n_estimators() -> usize {
    60
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

fn default_stopwords() -> Vec<String> {
    DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect()
}

fn default_http_bind() -> String {
    "0.0.0.0".into()
}

fn default_http_port() -> u16 {
    8084
}

/// Which questions the bag-of-words vocabulary is fitted on.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VocabularySource {
    #[default]
    Question1,
    Both,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_data_path")]
    pub data_path: String,
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_vectorizer_path")]
    pub vectorizer_path: String,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    #[serde(default)]
    pub vocabulary_source: VocabularySource,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_epsilon")]
    pub safe_div_epsilon: f64,
    #[serde(default = "default_stopwords")]
    pub stopwords: Vec<String>,
    #[serde(default = "default_http_bind")]
    pub http_bind: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            model_path: default_model_path(),
            vectorizer_path: default_vectorizer_path(),
            sample_size: default_sample_size(),
            random_state: default_random_state(),
            test_fraction: default_test_fraction(),
            max_features: default_max_features(),
            vocabulary_source: VocabularySource::default(),
            n_estimators: default_n_estimators(),
            max_depth: None,
            safe_div_epsilon: default_epsilon(),
            stopwords: default_stopwords(),
            http_bind: default_http_bind(),
            http_port: default_http_port(),
        }
    }
}

impl Settings {
    /// Reads settings from environment variables (`DATA_PATH`, `HTTP_PORT`,
    /// ...). `STOPWORDS` is a comma separated list.
    pub fn new() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("stopwords"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn feature_config(&self) -> FeatureConfig {
        FeatureConfig::new(
            self.stopwords
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty()),
            self.safe_div_epsilon,
        )
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            random_state: self.random_state,
        }
    }
}
