use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum Verdict {
    #[serde(rename = "duplicate")]
    #[strum(serialize = "duplicate")]
    Duplicate,
    #[serde(rename = "not duplicate")]
    #[strum(serialize = "not duplicate")]
    NotDuplicate,
}

impl Verdict {
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            Verdict::Duplicate
        } else {
            Verdict::NotDuplicate
        }
    }

    pub fn is_duplicate(self) -> bool {
        self == Verdict::Duplicate
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub question1: String,
    #[serde(default)]
    pub question2: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub verdict: Verdict,
    pub is_duplicate: bool,
    /// Share of the forest's vote for "duplicate"
    pub probability: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn verdict_text() {
        assert_eq!(Verdict::Duplicate.to_string(), "duplicate");
        assert_eq!(Verdict::from_label(0).to_string(), "not duplicate");
        assert_eq!(Verdict::from_str("not duplicate").unwrap(), Verdict::NotDuplicate);
        assert_eq!(
            serde_json::to_string(&Verdict::NotDuplicate).unwrap(),
            "\"not duplicate\""
        );
    }
}
