//! Bag-of-words vocabulary fitted once on a training corpus.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MAX_FEATURES: usize = 3000;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

/// Words of two or more word characters, lowercased.
pub fn analyze(document: &str) -> Vec<String> {
    let lowered = document.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Frozen term-to-column mapping.
///
/// Columns are assigned in ascending term order. Only the ordered term list
/// is serialized; the lookup table is rebuilt on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl From<Vec<String>> for Vocabulary {
    fn from(mut terms: Vec<String>) -> Self {
        terms.sort();
        terms.dedup();
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { terms, index }
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.terms
    }
}

impl Vocabulary {
    /// Keeps the `max_features` most frequent terms of the corpus.
    ///
    /// Terms rank by total count, ties by the term itself, so the same corpus
    /// always yields the same vocabulary.
    pub fn fit<I, S>(documents: I, max_features: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut n_docs = 0usize;
        for doc in documents {
            n_docs += 1;
            for term in analyze(doc.as_ref()) {
                *counts.entry(term).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let distinct = ranked.len();
        ranked.truncate(max_features);

        debug!(n_docs, distinct, kept = ranked.len(), "vocabulary fitted");
        Self::from(ranked.into_iter().map(|(t, _)| t).collect::<Vec<_>>())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn column(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Per-term counts for one document; unknown terms are ignored.
    pub fn transform(&self, document: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.terms.len()];
        for term in analyze(document) {
            if let Some(idx) = self.column(&term) {
                vector[idx] += 1.0;
            }
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_skips_single_characters() {
        assert_eq!(analyze("I am a Rust dev"), vec!["am", "rust", "dev"]);
    }

    #[test]
    fn fit_keeps_most_frequent_in_term_order() {
        let docs = ["python python rust", "rust go", "python java"];
        let vocab = Vocabulary::fit(docs, 2);
        assert_eq!(vocab.terms(), &["python".to_string(), "rust".to_string()]);
        assert_eq!(vocab.column("python"), Some(0));
        assert_eq!(vocab.column("go"), None);
    }

    #[test]
    fn ties_break_alphabetically() {
        let vocab = Vocabulary::fit(["delta charlie bravo alpha"], 2);
        assert_eq!(vocab.terms(), &["alpha".to_string(), "bravo".to_string()]);
    }

    #[test]
    fn transform_counts_known_terms() {
        let vocab = Vocabulary::fit(["learn python", "learn rust"], 10);
        let v = vocab.transform("learn python and learn more python");
        assert_eq!(v.len(), 3);
        assert_eq!(v[vocab.column("learn").unwrap()], 2.0);
        assert_eq!(v[vocab.column("python").unwrap()], 2.0);
        assert_eq!(v[vocab.column("rust").unwrap()], 0.0);
    }

    #[test]
    fn serializes_as_term_list() {
        let vocab = Vocabulary::fit(["beta alpha"], 10);
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"["alpha","beta"]"#);
        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vocab);
    }
}
