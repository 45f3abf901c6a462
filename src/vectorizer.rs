//! Word n-gram TF-IDF vectors
//!
//! Vocabulary and IDF weights are fitted once over the reference names and then
//! frozen. Vectors are sparse `(column, weight)` pairs sorted by column and
//! L2-normalized, so cosine similarity reduces to a merge-join dot product.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, MatchError};
use crate::stop_words::is_stop_word;

/// Default bound on the fitted vocabulary
pub const DEFAULT_MAX_FEATURES: usize = 10_000;

/// Knobs for fitting the vectorizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerParams {
    pub max_features: usize,
    pub ngram_min: usize,
    pub ngram_max: usize,
    pub stop_words: bool,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            ngram_min: 1,
            ngram_max: 3,
            stop_words: true,
        }
    }
}

impl VectorizerParams {
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_features == 0 {
            return Err(MatchError::InvalidParameter(
                "max_features must be at least 1".into(),
            ));
        }
        if self.ngram_min == 0 || self.ngram_min > self.ngram_max {
            return Err(MatchError::InvalidParameter(format!(
                "n-gram range {}..={} is empty or starts at zero",
                self.ngram_min, self.ngram_max
            )));
        }
        Ok(())
    }
}

/// Sparse, L2-normalized term vector. Entries are sorted by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cosine similarity of two normalized vectors, clamped to `[0, 1]`
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        if self.is_zero() || other.is_zero() {
            return 0.0;
        }

        let (mut i, mut j, mut dot) = (0, 0, 0.0);
        while i < self.entries.len() && j < other.entries.len() {
            let (ci, wi) = self.entries[i];
            let (cj, wj) = other.entries[j];
            match ci.cmp(&cj) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += wi * wj;
                    i += 1;
                    j += 1;
                }
            }
        }
        dot.clamp(0.0, 1.0)
    }
}

/// Split lower-cased text into runs of two or more word characters
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|tok| tok.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

/// Contiguous token windows of every length in `min..=max`
pub fn ngrams(tokens: &[String], min: usize, max: usize) -> Vec<String> {
    let mut grams = Vec::new();
    for n in min..=max {
        if n == 0 || n > tokens.len() {
            continue;
        }
        grams.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    grams
}

/// Fitted TF-IDF model
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    params: VectorizerParams,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fit vocabulary and IDF weights over a corpus of documents.
    pub fn fit<S: AsRef<str>>(documents: &[S], params: &VectorizerParams) -> CoreResult<Self> {
        params.validate()?;
        let n_docs = documents.len();

        // term -> (corpus frequency, document frequency)
        let mut stats: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for doc in documents {
            let mut seen: HashMap<String, usize> = HashMap::new();
            for gram in analyze(doc.as_ref(), params) {
                *seen.entry(gram).or_insert(0) += 1;
            }
            for (gram, count) in seen {
                let entry = stats.entry(gram).or_insert((0, 0));
                entry.0 += count;
                entry.1 += 1;
            }
        }

        let mut terms: Vec<(String, (usize, usize))> = stats.into_iter().collect();
        if terms.len() > params.max_features {
            // Stable sort keeps term order among equal frequencies.
            terms.sort_by(|a, b| b.1 .0.cmp(&a.1 .0));
            terms.truncate(params.max_features);
            terms.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let mut vocabulary = HashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (column, (term, (_, df))) in terms.into_iter().enumerate() {
            vocabulary.insert(term, column);
            idf.push(smoothed_idf(n_docs, df));
        }

        log::debug!(
            "fitted vectorizer: {} documents, {} terms",
            n_docs,
            vocabulary.len()
        );

        Ok(Self {
            params: params.clone(),
            vocabulary,
            idf,
        })
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Project text onto the fitted vocabulary. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for gram in analyze(text, &self.params) {
            if let Some(&column) = self.vocabulary.get(&gram) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(column, tf)| (column, tf * self.idf[column]))
            .collect();

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        } else {
            entries.clear();
        }
        SparseVector { entries }
    }
}

fn analyze(text: &str, params: &VectorizerParams) -> Vec<String> {
    let mut tokens = tokenize(text);
    if params.stop_words {
        tokens.retain(|tok| !is_stop_word(tok));
    }
    ngrams(&tokens, params.ngram_min, params.ngram_max)
}

fn smoothed_idf(n_docs: usize, df: usize) -> f64 {
    ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0
}
