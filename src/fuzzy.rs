//! Lexical fuzzy scoring for candidate rescoring
//!
//! Scores are on a 0-100 scale. `token_sort_ratio` ignores word order, which
//! covers the common case of reordered company names ("Corp Globex" vs
//! "Globex Corp") that the n-gram vectors undervalue.

/// Score for two identical strings
pub const PERFECT_SCORE: f64 = 100.0;

/// Normalized Indel similarity over characters: `100 * 2 * LCS / (|a| + |b|)`
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return PERFECT_SCORE;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    PERFECT_SCORE * 2.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// `ratio` after sorting whitespace-separated tokens on both sides
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sort_tokens(a), &sort_tokens(b))
}

/// Highest `token_sort_ratio` among `candidates` as `(position, score)`.
/// The earliest candidate wins a tie; `None` when there are no candidates.
pub fn best_match<'a, I>(query: &str, candidates: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, f64)> = None;
    for (pos, candidate) in candidates.into_iter().enumerate() {
        let score = token_sort_ratio(query, candidate);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((pos, score)),
        }
    }
    best
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Longest common subsequence length, two-row dynamic programming
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
