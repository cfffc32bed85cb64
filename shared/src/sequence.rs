//! Matching-block search over character sequences.
//!
//! Finds the longest contiguous block shared by two sequences and, by
//! recursing on both sides of it, the full list of matching blocks. When the
//! second sequence has 200 or more elements, elements that occur in more than
//! one percent of it (plus one) are not indexed as match starts, though a
//! match may still extend through them.

use std::collections::HashMap;

const AUTOJUNK_MIN_LEN: usize = 200;

/// A block where `a[a_start..a_start + size] == b[b_start..b_start + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// Index of `b`'s element positions, built once per comparison.
pub struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    pub fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &ch) in b.iter().enumerate() {
            b2j.entry(ch).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest block in `a[alo..ahi]` x `b[blo..bhi]`.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
        let (a, b) = (self.a, self.b);
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);

        // j2len[j] = length of the match ending at a[i - 1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next;
        }

        // Extend across elements skipped by the popularity filter.
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        Match {
            a_start: best_i,
            b_start: best_j,
            size: best_size,
        }
    }

    /// All matching blocks in ascending order, adjacent blocks merged, ending
    /// with the sentinel `(a.len(), b.len(), 0)`.
    pub fn matching_blocks(&self) -> Vec<Match> {
        let (la, lb) = (self.a.len(), self.b.len());
        let mut queue = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            if alo < m.a_start && blo < m.b_start {
                queue.push((alo, m.a_start, blo, m.b_start));
            }
            if m.a_start + m.size < ahi && m.b_start + m.size < bhi {
                queue.push((m.a_start + m.size, ahi, m.b_start + m.size, bhi));
            }
            blocks.push(m);
        }
        blocks.sort();

        let mut merged: Vec<Match> = Vec::with_capacity(blocks.len() + 1);
        for block in blocks {
            match merged.last_mut() {
                Some(last)
                    if last.a_start + last.size == block.a_start
                        && last.b_start + last.size == block.b_start =>
                {
                    last.size += block.size;
                }
                _ => merged.push(block),
            }
        }
        merged.push(Match {
            a_start: la,
            b_start: lb,
            size: 0,
        });
        merged
    }
}

/// Size of the longest common substring of `a` and `b`.
pub fn longest_match_len(a: &[char], b: &[char]) -> usize {
    SequenceMatcher::new(a, b)
        .find_longest_match(0, a.len(), 0, b.len())
        .size
}
