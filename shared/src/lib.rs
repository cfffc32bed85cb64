//! Duplicate-question detection shared by the trainer and the classifier
//! service: text normalization, pair features, the bag-of-words vocabulary,
//! the random forest, and the artifacts that carry them between the two.

pub mod artifact;
pub mod config;
pub mod dataset;
pub mod dto;
pub mod error;
pub mod features;
pub mod forest;
pub mod fuzzy;
pub mod predictor;
pub mod preprocess;
pub mod query_point;
pub mod sequence;
pub mod training;
pub mod vocabulary;
