//! Two-tier match resolution
//!
//! A query first retrieves its nearest reference names by vector similarity.
//! A strong enough top hit is accepted outright; otherwise the retrieved
//! candidates are rescored with `token_sort_ratio` and the best one is accepted
//! only if it clears the fuzzy threshold.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, MatchError};
use crate::fuzzy;
use crate::index::{Candidate, ReferenceIndex};

/// Cosine similarity at or above which the top candidate is accepted directly
pub const HIGH_CONFIDENCE: f64 = 0.85;

/// Fuzzy score at or above which a rescored candidate is accepted
pub const FUZZY_ACCEPT: f64 = 92.0;

/// Best candidate plus one runner-up
pub const CANDIDATES: usize = 2;

/// Predicted identifier for an unmatched query
pub const NO_MATCH: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub high_confidence: f64,
    pub fuzzy_accept: f64,
    pub candidates: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high_confidence: HIGH_CONFIDENCE,
            fuzzy_accept: FUZZY_ACCEPT,
            candidates: CANDIDATES,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> CoreResult<()> {
        if !(0.0..=1.0).contains(&self.high_confidence) {
            return Err(MatchError::InvalidParameter(format!(
                "high-confidence threshold {} is outside [0, 1]",
                self.high_confidence
            )));
        }
        if !(0.0..=100.0).contains(&self.fuzzy_accept) {
            return Err(MatchError::InvalidParameter(format!(
                "fuzzy threshold {} is outside [0, 100]",
                self.fuzzy_accept
            )));
        }
        if self.candidates == 0 {
            return Err(MatchError::InvalidParameter(
                "candidate count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Transition out of retrieval: accept on vector similarity or fall back
    pub fn after_retrieval(&self, top_similarity: f64) -> Option<Decision> {
        (top_similarity >= self.high_confidence).then_some(Decision::AcceptVector)
    }

    /// Transition out of rescoring
    pub fn after_rescoring(&self, best_score: f64) -> Decision {
        if best_score >= self.fuzzy_accept {
            Decision::AcceptFuzzy
        } else {
            Decision::Reject
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    AcceptVector,
    AcceptFuzzy,
    Reject,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Decision::AcceptVector => "accept_vector",
            Decision::AcceptFuzzy => "accept_fuzzy",
            Decision::Reject => "reject",
        };
        f.write_str(label)
    }
}

/// Outcome of resolving one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub decision: Decision,
    /// Identifier of the accepted candidate; `None` on reject
    pub identifier: Option<i64>,
    /// Cosine similarity of the top retrieved candidate
    pub similarity: f64,
    /// Best fuzzy score, present only when rescoring ran
    pub fuzzy_score: Option<f64>,
    /// Canonical name of the accepted candidate
    pub matched_name: Option<String>,
}

impl Resolution {
    fn reject(similarity: f64, fuzzy_score: Option<f64>) -> Self {
        Self {
            decision: Decision::Reject,
            identifier: None,
            similarity,
            fuzzy_score,
            matched_name: None,
        }
    }

    pub fn predicted_identifier(&self) -> i64 {
        match self.decision {
            Decision::Reject => NO_MATCH,
            _ => self.identifier.unwrap_or(NO_MATCH),
        }
    }
}

/// Per-decision counts for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionTally {
    pub accept_vector: usize,
    pub accept_fuzzy: usize,
    pub reject: usize,
}

impl DecisionTally {
    pub fn record(&mut self, decision: Decision) {
        match decision {
            Decision::AcceptVector => self.accept_vector += 1,
            Decision::AcceptFuzzy => self.accept_fuzzy += 1,
            Decision::Reject => self.reject += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.accept_vector + self.accept_fuzzy + self.reject
    }
}

/// Resolves canonical query names against an owned, read-only index
#[derive(Debug)]
pub struct MatchResolver {
    index: ReferenceIndex,
    thresholds: Thresholds,
}

impl MatchResolver {
    pub fn new(index: ReferenceIndex, thresholds: Thresholds) -> CoreResult<Self> {
        thresholds.validate()?;
        Ok(Self { index, thresholds })
    }

    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    /// Retrieved candidates for a canonical name, best first
    pub fn candidates(&self, query_canonical: &str) -> Vec<Candidate<'_>> {
        self.index.query(query_canonical, self.thresholds.candidates)
    }

    pub fn resolve(&self, query_canonical: &str) -> Resolution {
        if query_canonical.trim().is_empty() {
            return Resolution::reject(0.0, None);
        }

        // Names that share a vector or have none still resolve to themselves.
        if let Some(identifier) = self.index.identifier_for(query_canonical) {
            return Resolution {
                decision: Decision::AcceptVector,
                identifier: Some(identifier),
                similarity: 1.0,
                fuzzy_score: None,
                matched_name: Some(query_canonical.to_string()),
            };
        }

        let candidates = self.candidates(query_canonical);
        let Some(top) = candidates.first() else {
            return Resolution::reject(0.0, None);
        };

        if let Some(decision) = self.thresholds.after_retrieval(top.similarity) {
            return self.accept(decision, top, top.similarity, None);
        }

        let names = candidates.iter().map(|c| c.entity.canonical_name.as_str());
        let Some((pos, score)) = fuzzy::best_match(query_canonical, names) else {
            return Resolution::reject(top.similarity, None);
        };

        match self.thresholds.after_rescoring(score) {
            Decision::Reject => Resolution::reject(top.similarity, Some(score)),
            decision => self.accept(decision, &candidates[pos], top.similarity, Some(score)),
        }
    }

    /// Resolve every query in parallel; output order matches input order.
    pub fn resolve_batch<S>(&self, queries: &[S]) -> (Vec<Resolution>, DecisionTally)
    where
        S: AsRef<str> + Sync,
    {
        let resolutions: Vec<Resolution> = queries
            .par_iter()
            .map(|q| self.resolve(q.as_ref()))
            .collect();

        let mut tally = DecisionTally::default();
        for r in &resolutions {
            tally.record(r.decision);
        }
        log::debug!(
            "resolved {} queries: {} vector, {} fuzzy, {} rejected",
            tally.total(),
            tally.accept_vector,
            tally.accept_fuzzy,
            tally.reject
        );
        (resolutions, tally)
    }

    fn accept(
        &self,
        decision: Decision,
        chosen: &Candidate<'_>,
        similarity: f64,
        fuzzy_score: Option<f64>,
    ) -> Resolution {
        let name = &chosen.entity.canonical_name;
        let identifier = self
            .index
            .identifier_for(name)
            .unwrap_or(chosen.entity.identifier);
        Resolution {
            decision,
            identifier: Some(identifier),
            similarity,
            fuzzy_score,
            matched_name: Some(name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ReferenceEntity;
    use crate::normalize::normalize_str;
    use crate::vectorizer::VectorizerParams;

    fn resolver(names: &[(i64, &str)]) -> MatchResolver {
        let entities = names
            .iter()
            .map(|(id, name)| ReferenceEntity::new(*id, *name))
            .collect();
        let index = ReferenceIndex::build(entities, &VectorizerParams::default()).unwrap();
        MatchResolver::new(index, Thresholds::default()).unwrap()
    }

    fn acme_globex() -> MatchResolver {
        resolver(&[(1, "Acme Inc"), (2, "Globex Corp")])
    }

    #[test]
    fn test_end_to_end_scenario() {
        let r = acme_globex();
        assert_eq!(
            r.resolve(&normalize_str("ACME INCORPORATED")).predicted_identifier(),
            1
        );
        let miss = r.resolve(&normalize_str("Totally Unrelated Co"));
        assert_eq!(miss.decision, Decision::Reject);
        assert_eq!(miss.predicted_identifier(), NO_MATCH);
    }

    #[test]
    fn test_self_match() {
        let names = [
            (1, "Acme Inc"),
            (2, "Globex Corp"),
            (3, "Initech LLC"),
            (4, "Umbrella Pharmaceuticals"),
            (5, "Stark Industries"),
            // same vector as "acme inc": both reduce to {acme}
            (6, "Acme Ltd"),
            // every token is a stop word, so the vector is zero
            (7, "The Co"),
        ];
        let r = resolver(&names);
        for (id, name) in names {
            let res = r.resolve(&normalize_str(name));
            assert_eq!(res.predicted_identifier(), id, "self-match failed for {name}");
            assert_eq!(res.decision, Decision::AcceptVector);
        }
    }

    #[test]
    fn test_shared_vector_prefers_exact_canonical_name() {
        let r = resolver(&[(1, "Acme Inc"), (2, "Acme Ltd")]);
        assert_eq!(r.resolve("acme ltd").predicted_identifier(), 2);
        assert_eq!(r.resolve("acme inc").predicted_identifier(), 1);
        // Not an exact name: ties still go to reference order.
        assert_eq!(r.resolve("acme").predicted_identifier(), 1);
    }

    #[test]
    fn test_zero_vector_reference_name_resolves_to_itself() {
        let r = resolver(&[(1, "Acme"), (2, "Globex"), (3, "The Co")]);
        let res = r.resolve(&normalize_str("The Co"));
        assert_eq!(res.decision, Decision::AcceptVector);
        assert_eq!(res.similarity, 1.0);
        assert_eq!(res.predicted_identifier(), 3);
    }

    #[test]
    fn test_reordered_words_accepted_by_fuzzy() {
        let r = acme_globex();
        let res = r.resolve("corp globex");
        assert!(res.similarity < HIGH_CONFIDENCE);
        assert_eq!(res.decision, Decision::AcceptFuzzy);
        assert_eq!(res.fuzzy_score, Some(100.0));
        assert_eq!(res.predicted_identifier(), 2);
    }

    #[test]
    fn test_empty_query_rejects() {
        let r = acme_globex();
        let res = r.resolve("");
        assert_eq!(res.decision, Decision::Reject);
        assert_eq!(res.fuzzy_score, None);
        assert_eq!(res.predicted_identifier(), NO_MATCH);
    }

    #[test]
    fn test_vector_threshold_is_inclusive() {
        let t = Thresholds::default();
        assert_eq!(t.after_retrieval(0.85), Some(Decision::AcceptVector));
        assert_eq!(t.after_retrieval(0.849999), None);
    }

    #[test]
    fn test_fuzzy_threshold_is_inclusive() {
        let t = Thresholds::default();
        assert_eq!(t.after_rescoring(92.0), Decision::AcceptFuzzy);
        assert_eq!(t.after_rescoring(91.0), Decision::Reject);
    }

    #[test]
    fn test_duplicate_canonical_names_resolve_to_first() {
        let r = resolver(&[(7, "Acme Inc"), (8, "ACME INC"), (9, "Globex Corp")]);
        assert_eq!(r.resolve("acme inc").predicted_identifier(), 7);
    }

    #[test]
    fn test_batch_preserves_order_and_tallies() {
        let r = acme_globex();
        let queries = vec![
            normalize_str("Totally Unrelated Co"),
            normalize_str("Globex Corp"),
            String::new(),
            normalize_str("Corp Globex"),
            normalize_str("Acme Inc"),
        ];
        let (out, tally) = r.resolve_batch(&queries);
        let ids: Vec<i64> = out.iter().map(Resolution::predicted_identifier).collect();
        assert_eq!(ids, vec![-1, 2, -1, 2, 1]);
        assert_eq!(
            tally,
            DecisionTally {
                accept_vector: 2,
                accept_fuzzy: 1,
                reject: 2,
            }
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let r = acme_globex();
        let a = r.resolve("globex corporation");
        let b = r.resolve("globex corporation");
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_thresholds() {
        let index = ReferenceIndex::build(
            vec![ReferenceEntity::new(1, "Acme")],
            &VectorizerParams::default(),
        )
        .unwrap();
        let bad = Thresholds {
            high_confidence: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            MatchResolver::new(index, bad),
            Err(MatchError::InvalidParameter(_))
        ));
        let zero = Thresholds {
            candidates: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }
}
