//! Command implementations

pub mod completions;
pub mod config;
pub mod lookup;
pub mod match_cmd;
pub mod normalize;

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::MatcherOverrides;
use crate::config::RuntimeContext;
use crate::dataset;
use crate::index::ReferenceIndex;
use crate::resolver::{MatchResolver, Thresholds};

/// Configured thresholds with command-line overrides applied
pub fn effective_thresholds(ctx: &RuntimeContext, overrides: &MatcherOverrides) -> Thresholds {
    let mut thresholds = ctx.config.matching.thresholds();
    if let Some(t) = overrides.threshold {
        thresholds.high_confidence = t;
    }
    if let Some(t) = overrides.fuzzy_threshold {
        thresholds.fuzzy_accept = t;
    }
    if let Some(k) = overrides.candidates {
        thresholds.candidates = k;
    }
    thresholds
}

/// Load a reference file and build a resolver over it
pub fn build_resolver(
    ctx: &RuntimeContext,
    reference: &Path,
    thresholds: Thresholds,
) -> Result<MatchResolver> {
    let entities = dataset::load_reference(reference, &ctx.config.data)?;
    let index = ReferenceIndex::build(entities, &ctx.config.index.vectorizer_params())
        .with_context(|| format!("building index from {}", reference.display()))?;
    Ok(MatchResolver::new(index, thresholds)?)
}
