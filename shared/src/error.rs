use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Artifact error ({path}): {reason}")]
    Artifact { path: String, reason: String },
    #[error("Dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),
    #[error("Prediction failed: {0}")]
    Prediction(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn artifact(path: impl AsRef<std::path::Path>, reason: impl Into<String>) -> Self {
        AppError::Artifact {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }
}
