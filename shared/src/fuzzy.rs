//! Fuzzy string similarity scores on a 0-100 scale.
//!
//! `ratio` is the normalized indel (Levenshtein with substitution cost 2)
//! similarity. The remaining scorers build on it the way the usual fuzzy
//! matching toolkits do: windowed partial matching, sorted tokens, and
//! token-set comparison.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::sequence::SequenceMatcher;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").expect("valid non-word regex"));

/// Rounds half to even, matching the integer rounding used for the scores.
fn intr(value: f64) -> f64 {
    value.round_ties_even()
}

/// Length of the longest common subsequence of `a` and `b`.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; short.len() + 1];
    for &lc in long {
        let mut diag = 0;
        for (j, &sc) in short.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if lc == sc {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[short.len()]
}

/// Similarity in [0, 1] of two character sequences.
fn similarity(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(a, b) as f64 / total as f64
}

/// Overall similarity. Equal strings score 100, an empty side scores 0.
pub fn ratio(s1: &str, s2: &str) -> f64 {
    if s1 == s2 {
        return 100.0;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    intr(100.0 * similarity(&a, &b))
}

/// Best similarity of the shorter string against equally long windows of
/// the longer one, anchored at each matching block.
///
/// Anchors come from the greedy [`SequenceMatcher`] blocks while windows are
/// scored with the indel ratio, so results can differ from fuzzywuzzy on
/// pairs whose greedy and optimal alignments differ.
pub fn partial_ratio(s1: &str, s2: &str) -> f64 {
    if s1 == s2 {
        return 100.0;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }

    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let blocks = SequenceMatcher::new(shorter, longer).matching_blocks();
    let mut best = 0.0f64;
    for block in blocks {
        let start = block.b_start.saturating_sub(block.a_start);
        let end = (start + shorter.len()).min(longer.len());
        let window = &longer[start..end];

        let score = similarity(shorter, window);
        if score > 0.995 {
            return 100.0;
        }
        best = best.max(score);
    }
    intr(100.0 * best)
}

/// Drops Latin-1 supplement characters, replaces non-word characters with
/// spaces, lowercases and trims.
pub fn full_process(s: &str) -> String {
    let ascii: String = s
        .chars()
        .filter(|c| !('\u{80}'..='\u{ff}').contains(c))
        .collect();
    NON_WORD
        .replace_all(&ascii, " ")
        .to_lowercase()
        .trim()
        .to_string()
}

/// [`ratio`] over processed strings; 0 when either side processes to empty.
pub fn qratio(s1: &str, s2: &str) -> f64 {
    let p1 = full_process(s1);
    let p2 = full_process(s2);
    if p1.is_empty() || p2.is_empty() {
        return 0.0;
    }
    ratio(&p1, &p2)
}

fn sorted_tokens(s: &str) -> String {
    let processed = full_process(s);
    let mut tokens: Vec<&str> = processed.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// [`ratio`] after sorting each side's tokens alphabetically.
pub fn token_sort_ratio(s1: &str, s2: &str) -> f64 {
    ratio(&sorted_tokens(s1), &sorted_tokens(s2))
}

/// Compares the shared tokens against each side's shared-plus-remaining
/// tokens, ignoring order and duplicates.
pub fn token_set_ratio(s1: &str, s2: &str) -> f64 {
    let p1 = full_process(s1);
    let p2 = full_process(s2);
    if p1.is_empty() || p2.is_empty() {
        return 0.0;
    }

    let tokens1: BTreeSet<&str> = p1.split_whitespace().collect();
    let tokens2: BTreeSet<&str> = p2.split_whitespace().collect();

    let section = tokens1.intersection(&tokens2).copied().collect::<Vec<_>>().join(" ");
    let diff_1to2 = tokens1.difference(&tokens2).copied().collect::<Vec<_>>().join(" ");
    let diff_2to1 = tokens2.difference(&tokens1).copied().collect::<Vec<_>>().join(" ");

    let combined_1to2 = format!("{section} {diff_1to2}").trim().to_string();
    let combined_2to1 = format!("{section} {diff_2to1}").trim().to_string();

    [
        ratio(&section, &combined_1to2),
        ratio(&section, &combined_2to1),
        ratio(&combined_1to2, &combined_2to1),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}
