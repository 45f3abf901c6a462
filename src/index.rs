//! Reference index: TF-IDF vectors over canonical reference names
//!
//! Built once from the full reference set, then queried read-only. Queries may
//! run concurrently against a shared `&ReferenceIndex`.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{CoreResult, MatchError};
use crate::normalize::normalize_str;
use crate::vectorizer::{SparseVector, TfidfVectorizer, VectorizerParams};

/// A known company from the reference set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEntity {
    pub identifier: i64,
    pub raw_name: String,
    pub canonical_name: String,
}

impl ReferenceEntity {
    pub fn new(identifier: i64, raw_name: impl Into<String>) -> Self {
        let raw_name = raw_name.into();
        let canonical_name = normalize_str(&raw_name);
        Self {
            identifier,
            raw_name,
            canonical_name,
        }
    }
}

/// One retrieved entity with its cosine similarity to the query
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub entity: &'a ReferenceEntity,
    pub similarity: f64,
}

#[derive(Debug)]
pub struct ReferenceIndex {
    entities: Vec<ReferenceEntity>,
    vectors: Vec<SparseVector>,
    vectorizer: TfidfVectorizer,
    by_canonical: HashMap<String, i64>,
}

impl ReferenceIndex {
    pub fn build(entities: Vec<ReferenceEntity>, params: &VectorizerParams) -> CoreResult<Self> {
        if entities.is_empty() {
            return Err(MatchError::EmptyReference);
        }

        let names: Vec<&str> = entities.iter().map(|e| e.canonical_name.as_str()).collect();
        let vectorizer = TfidfVectorizer::fit(&names, params)?;
        let vectors: Vec<SparseVector> = names
            .par_iter()
            .map(|name| vectorizer.transform(name))
            .collect();

        let mut by_canonical = HashMap::with_capacity(entities.len());
        let mut duplicates = 0usize;
        for entity in &entities {
            let kept = *by_canonical
                .entry(entity.canonical_name.clone())
                .or_insert(entity.identifier);
            if kept != entity.identifier {
                duplicates += 1;
                log::warn!(
                    "canonical name {:?} maps to {} and {}; keeping {}",
                    entity.canonical_name,
                    kept,
                    entity.identifier,
                    kept
                );
            }
        }

        log::info!(
            "built reference index: {} entities, {} terms, {} duplicate canonical names",
            entities.len(),
            vectorizer.vocabulary_len(),
            duplicates
        );

        Ok(Self {
            entities,
            vectors,
            vectorizer,
            by_canonical,
        })
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vectorizer.vocabulary_len()
    }

    /// Top `k` entities by cosine similarity, descending. Ties keep reference
    /// order. An empty query skips retrieval and returns the first `k`
    /// entities at similarity 0.
    pub fn query(&self, name: &str, k: usize) -> Vec<Candidate<'_>> {
        if name.trim().is_empty() {
            return self
                .entities
                .iter()
                .take(k)
                .map(|entity| Candidate {
                    entity,
                    similarity: 0.0,
                })
                .collect();
        }

        let query = self.vectorizer.transform(name);
        let mut scored: Vec<(usize, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, query.cosine(v)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(k)
            .map(|(i, similarity)| Candidate {
                entity: &self.entities[i],
                similarity,
            })
            .collect()
    }

    /// Identifier for a canonical name; the first entity in reference order
    /// wins when several share the name.
    pub fn identifier_for(&self, canonical_name: &str) -> Option<i64> {
        self.by_canonical.get(canonical_name).copied()
    }
}
