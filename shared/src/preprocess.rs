//! Question normalization applied before any feature is computed.
//!
//! Training and serving both call [`preprocess`], so the symbol table below is
//! part of the feature contract with a persisted model.

use once_cell::sync::Lazy;
use regex::Regex;

/// Symbols spelled out as words, applied in this order.
pub const SYMBOL_WORDS: &[(char, &str)] = &[
    ('%', " percent "),
    ('$', " dollar "),
    ('₹', " rupee "),
    ('€', " euro "),
    ('@', " at "),
];

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("valid html tag regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Normalizes a raw question into its cleaned form.
///
/// The output is lowercase, contains no ASCII punctuation, and has single
/// spaces between words with nothing at either end. Applying it twice gives
/// the same string as applying it once.
pub fn preprocess(text: &str) -> String {
    let mut text = text.to_lowercase().trim().to_string();

    for (symbol, word) in SYMBOL_WORDS {
        if text.contains(*symbol) {
            text = text.replace(*symbol, word);
        }
    }

    let text = HTML_TAG.replace_all(&text, "");
    let text: String = text.chars().filter(|c| !c.is_ascii_punctuation()).collect();
    let text = WHITESPACE.replace_all(&text, " ");

    text.trim().to_string()
}

/// Splits a cleaned question into its whitespace tokens.
pub fn tokens(cleaned: &str) -> Vec<&str> {
    cleaned.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(preprocess("How do I learn Python?"), "how do i learn python");
    }

    #[test]
    fn spells_out_symbols() {
        assert_eq!(preprocess("50% of $10"), "50 percent of dollar 10");
        assert_eq!(preprocess("100₹ or 5€"), "100 rupee or 5 euro");
        assert_eq!(preprocess("me@home"), "me at home");
    }

    #[test]
    fn removes_html_tags() {
        assert_eq!(preprocess("<b>Bold</b> move"), "bold move");
        assert_eq!(preprocess("a <br/> b"), "a b");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(preprocess("  what\t is \n  this  "), "what is this");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(preprocess(""), "");
        assert_eq!(preprocess("   "), "");
        assert_eq!(preprocess("?!..."), "");
    }

    #[test]
    fn trailing_symbol_does_not_leave_space() {
        let once = preprocess("growth of 50%");
        assert_eq!(once, "growth of 50 percent");
        assert_eq!(preprocess(&once), once);
    }

    #[test]
    fn unicode_input_survives() {
        let out = preprocess("Qu'est-ce que c'est, ÉCOLE?");
        assert_eq!(out, "questce que cest école");
    }
}
