//! Labelled question pairs read from the training CSV.

use std::io::Read;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionPair {
    pub question1: String,
    pub question2: String,
    pub is_duplicate: u8,
}

/// One CSV record; any other columns (`id`, `qid1`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct RawRow {
    question1: Option<String>,
    question2: Option<String>,
    is_duplicate: Option<String>,
}

impl RawRow {
    fn into_pair(self) -> Option<QuestionPair> {
        let question1 = self.question1.filter(|q| !q.is_empty())?;
        let question2 = self.question2.filter(|q| !q.is_empty())?;
        let is_duplicate = match self.is_duplicate?.trim() {
            "0" | "0.0" => 0,
            "1" | "1.0" => 1,
            _ => return None,
        };
        Some(QuestionPair {
            question1,
            question2,
            is_duplicate,
        })
    }
}

/// Rows kept and rows dropped while reading.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub pairs: Vec<QuestionPair>,
    pub dropped: usize,
}

impl Dataset {
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {e}", path.display()),
            ))
        })?;
        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            rows = dataset.pairs.len(),
            dropped = dataset.dropped,
            "training data loaded"
        );
        Ok(dataset)
    }

    /// Reads pairs from CSV with a header row.
    ///
    /// Records that fail to parse, miss a question, or carry a label other
    /// than 0/1 are dropped and counted. A missing required column is an error.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = csv.headers()?.clone();
        for column in ["question1", "question2", "is_duplicate"] {
            if !headers.iter().any(|h| h == column) {
                return Err(AppError::InvalidInput(format!(
                    "training data has no `{column}` column"
                )));
            }
        }

        let mut dataset = Dataset::default();
        for (line, record) in csv.deserialize::<RawRow>().enumerate() {
            match record.map(RawRow::into_pair) {
                Ok(Some(pair)) => dataset.pairs.push(pair),
                Ok(None) => dataset.dropped += 1,
                Err(e) => {
                    warn!(line = line + 2, %e, "skipping unreadable row");
                    dataset.dropped += 1;
                }
            }
        }

        if dataset.dropped > 0 {
            warn!(dropped = dataset.dropped, "dropped incomplete rows");
        }
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Uniform sample of `n` rows without replacement; all rows when `n`
    /// exceeds the dataset.
    pub fn sample(mut self, n: usize, seed: u64) -> Self {
        if n < self.pairs.len() {
            let mut rng = StdRng::seed_from_u64(seed);
            let (chosen, _) = self.pairs.partial_shuffle(&mut rng, n);
            self.pairs = chosen.to_vec();
        }
        self
    }
}

/// Shuffles `0..n` and splits it into `(train, test)` indices with
/// `ceil(test_fraction * n)` test rows.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..1.0).contains(&test_fraction) {
        return Err(AppError::InvalidInput(format!(
            "test fraction {test_fraction} is not in [0, 1)"
        )));
    }
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test >= n && n > 0 {
        return Err(AppError::InvalidInput(format!(
            "{n} rows leave nothing to train on with test fraction {test_fraction}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = indices.split_off(n_test);
    Ok((train, indices))
}
