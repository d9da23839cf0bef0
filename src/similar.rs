//! Did-you-mean suggestions for unknown names
//!
//! Closeness is the Ratcliff/Obershelp ratio: twice the number of characters
//! in matching blocks over the combined length. Blocks are found by taking
//! the longest common run and recursing on either side of it.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::Equation;
use crate::registry::Registry;

pub const DEFAULT_CUTOFF: f64 = 0.6;
pub const DEFAULT_SUGGESTIONS: usize = 3;

/// Similarity of `a` and `b` in `0.0..=1.0`
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common run in `a[alo..ahi]` and `b[blo..bhi]`, earliest on ties
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best) = (alo, blo, 0);
    // current[j + 1] is the length of the common run ending at a[i], b[j]
    let mut previous = vec![0usize; b.len() + 1];

    for i in alo..ahi {
        let mut current = vec![0usize; b.len() + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = previous[j] + 1;
                current[j + 1] = k;
                if k > best {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best = k;
                }
            }
        }
        previous = current;
    }

    (best_i, best_j, best)
}

/// Up to `n` of `candidates` scoring at least `cutoff` against `word`,
/// best first
pub fn close_matches<'a>(
    word: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    n: usize,
    cutoff: f64,
) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|candidate| (ratio(candidate, word), candidate))
        .filter(|(score, _)| *score >= cutoff)
        .collect();

    scored.sort_by(|x, y| {
        y.0.partial_cmp(&x.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| y.1.cmp(x.1))
    });

    scored
        .into_iter()
        .take(n)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Suggestions for every name in `equation` the registry does not know.
///
/// Known names and names without a close match are left out.
pub fn find_similar(
    registry: &Registry,
    equation: &Equation,
    cutoff: f64,
    n: usize,
) -> BTreeMap<String, Vec<String>> {
    let keywords = registry.keywords();

    equation
        .iter()
        .map(|r| r.name())
        .filter(|name| !registry.is_known(name))
        .filter_map(|name| {
            let words = close_matches(name, keywords.iter().copied(), n, cutoff);
            (!words.is_empty()).then(|| (name.to_string(), words))
        })
        .collect()
}
