//! Single-name lookup: show what the resolver sees for one query

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::LookupArgs;
use crate::commands::{build_resolver, effective_thresholds};
use crate::config::RuntimeContext;
use crate::fuzzy::token_sort_ratio;
use crate::index::Candidate;
use crate::normalize::normalize_str;
use crate::output::{format_score, print_output, print_table, wants_table};
use crate::resolver::Resolution;

#[derive(Debug, Serialize, Tabled)]
struct CandidateRow {
    rank: usize,
    identifier: i64,
    name: String,
    similarity: String,
    fuzzy: String,
}

#[derive(Debug, Serialize)]
struct LookupReport<'a> {
    query: &'a str,
    canonical: &'a str,
    candidates: &'a [CandidateRow],
    resolution: &'a Resolution,
    predicted_identifier: i64,
}

pub fn run(ctx: &RuntimeContext, args: LookupArgs) -> Result<()> {
    let thresholds = effective_thresholds(ctx, &args.overrides);
    thresholds.validate()?;
    let resolver = build_resolver(ctx, &args.reference, thresholds)?;

    let canonical = normalize_str(&args.name);
    let k = args.k.unwrap_or(thresholds.candidates);
    let rows = candidate_rows(&canonical, &resolver.index().query(&canonical, k));
    let resolution = resolver.resolve(&canonical);

    if wants_table(ctx) {
        println!("query:     {}", args.name);
        println!("canonical: {canonical}");
        print_table(ctx, &rows)?;
        println!(
            "decision:  {} -> {}",
            resolution.decision,
            resolution.predicted_identifier()
        );
        return Ok(());
    }

    print_output(
        ctx,
        &LookupReport {
            query: &args.name,
            canonical: &canonical,
            candidates: &rows,
            resolution: &resolution,
            predicted_identifier: resolution.predicted_identifier(),
        },
    )
}

fn candidate_rows(canonical: &str, candidates: &[Candidate<'_>]) -> Vec<CandidateRow> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| CandidateRow {
            rank: i + 1,
            identifier: c.entity.identifier,
            name: c.entity.raw_name.clone(),
            similarity: format_score(c.similarity, 4),
            fuzzy: format_score(token_sort_ratio(canonical, &c.entity.canonical_name), 1),
        })
        .collect()
}
