//! Batch matching: reference file + query file -> predictions file

use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::MatchArgs;
use crate::commands::{build_resolver, effective_thresholds};
use crate::config::RuntimeContext;
use crate::cost::{cost, CostRecord, CostSummary};
use crate::dataset::{self, MatchResult, QuerySet};
use crate::output::{format_score, print_output, print_table, wants_table};
use crate::resolver::{DecisionTally, Resolution};

/// Summary printed after a run
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub reference_rows: usize,
    pub vocabulary: usize,
    pub query_rows: usize,
    pub evaluation: bool,
    pub decisions: DecisionTally,
    pub elapsed: String,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostReport>,
}

#[derive(Debug, Serialize)]
pub struct CostReport {
    pub summary: CostSummary,
    pub total: u64,
    pub accuracy: f64,
    /// Rows without ground truth, left out of the summary
    pub unscored: usize,
}

#[derive(Tabled, Serialize)]
struct ReportRow {
    metric: String,
    value: String,
}

pub fn run(ctx: &RuntimeContext, args: MatchArgs) -> Result<()> {
    let started = Instant::now();
    let thresholds = effective_thresholds(ctx, &args.overrides);
    thresholds.validate()?;

    let resolver = build_resolver(ctx, &args.reference, thresholds)?;
    let queries = dataset::load_queries(&args.query, &ctx.config.data)?;

    let (resolutions, decisions) = resolver.resolve_batch(&queries.canonical_names());
    let results = to_results(&queries, &resolutions);
    dataset::write_predictions(&args.output, &queries, &results, &ctx.config.data)?;

    let cost = queries
        .evaluation
        .then(|| cost_report(&queries, &results));
    let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);

    log::info!(
        "matched {} queries in {}",
        queries.records.len(),
        humantime::format_duration(elapsed)
    );

    let report = RunReport {
        reference_rows: resolver.index().len(),
        vocabulary: resolver.index().vocabulary_len(),
        query_rows: queries.records.len(),
        evaluation: queries.evaluation,
        decisions,
        elapsed: humantime::format_duration(elapsed).to_string(),
        output: args.output.display().to_string(),
        cost,
    };

    if wants_table(ctx) {
        print_table(ctx, &report_rows(&report))
    } else {
        print_output(ctx, &report)
    }
}

fn to_results(queries: &QuerySet, resolutions: &[Resolution]) -> Vec<MatchResult> {
    queries
        .records
        .iter()
        .zip(resolutions)
        .map(|(query, resolution)| MatchResult {
            row_index: query.row_index,
            predicted_identifier: resolution.predicted_identifier(),
        })
        .collect()
}

fn cost_report(queries: &QuerySet, results: &[MatchResult]) -> CostReport {
    let records: Vec<CostRecord> = queries
        .records
        .iter()
        .zip(results)
        .filter_map(|(query, result)| {
            let truth = query.true_identifier?;
            Some(CostRecord {
                row_index: query.row_index,
                cost: cost(truth, result.predicted_identifier),
            })
        })
        .collect();
    let unscored = queries.records.len() - records.len();

    let mut summary = CostSummary::default();
    summary.extend(records);

    CostReport {
        total: summary.total(),
        accuracy: summary.accuracy(),
        summary,
        unscored,
    }
}

fn report_rows(report: &RunReport) -> Vec<ReportRow> {
    let mut rows = vec![
        row("reference rows", report.reference_rows),
        row("vocabulary terms", report.vocabulary),
        row("query rows", report.query_rows),
        row("accepted (vector)", report.decisions.accept_vector),
        row("accepted (fuzzy)", report.decisions.accept_fuzzy),
        row("no match", report.decisions.reject),
        row("elapsed", &report.elapsed),
        row("output", &report.output),
    ];

    if let Some(cost_report) = &report.cost {
        for (value, count) in &cost_report.summary.counts {
            rows.push(row(&format!("cost {value}"), count));
        }
        rows.push(row("total cost", cost_report.total));
        rows.push(row("accuracy", format_score(cost_report.accuracy, 4)));
        if cost_report.unscored > 0 {
            rows.push(row("unscored rows", cost_report.unscored));
        }
    }
    rows
}

fn row(metric: &str, value: impl ToString) -> ReportRow {
    ReportRow {
        metric: metric.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use clap::Parser;
    use tempfile::TempDir;

    use crate::cli::{Cli, Command};
    use crate::dataset::QueryRecord;

    fn parse(dir: &TempDir, args: &[&str]) -> (RuntimeContext, Command) {
        let config = dir.path().join("config.toml");
        let mut argv = vec!["cmatch", "--quiet", "--format", "json", "--config"];
        argv.push(config.to_str().unwrap());
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        (RuntimeContext::new(&cli.global).unwrap(), cli.command)
    }

    #[test]
    fn test_match_run_writes_predictions_in_query_order() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("g.csv");
        let query = dir.path().join("s.csv");
        let output = dir.path().join("out").join("pred.csv");
        fs::write(&reference, "company_id|name\n1|Acme Inc\n2|Globex Corp\n").unwrap();
        fs::write(
            &query,
            "train_index|name|company_id\n\
             0|ACME INCORPORATED|1\n\
             1|Totally Unrelated Co|2\n\
             2|Corp Globex|2\n\
             3||1\n",
        )
        .unwrap();

        let (ctx, command) = parse(
            &dir,
            &[
                "match",
                "--reference",
                reference.to_str().unwrap(),
                "--query",
                query.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ],
        );
        let Command::Match(args) = command else {
            panic!("expected match command");
        };
        run(&ctx, args).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "train_index|name|company_id|company_id_pred|cost\n\
             0|ACME INCORPORATED|1|1|0\n\
             1|Totally Unrelated Co|2|-1|1\n\
             2|Corp Globex|2|2|0\n\
             3||1|-1|1\n"
        );
    }

    fn query_set() -> QuerySet {
        let rec = |row_index, truth| QueryRecord {
            row_index,
            raw_name: String::new(),
            canonical_name: String::new(),
            true_identifier: truth,
        };
        QuerySet {
            index_column: "train_index".into(),
            evaluation: true,
            records: vec![rec(0, Some(1)), rec(1, Some(2)), rec(2, None), rec(3, Some(4))],
        }
    }

    #[test]
    fn test_cost_report_skips_rows_without_truth() {
        let queries = query_set();
        let results: Vec<MatchResult> = [1, -1, 3, 9]
            .into_iter()
            .zip(0..)
            .map(|(predicted_identifier, row_index)| MatchResult {
                row_index,
                predicted_identifier,
            })
            .collect();

        let report = cost_report(&queries, &results);
        assert_eq!(report.unscored, 1);
        assert_eq!(report.summary.rows(), 3);
        assert_eq!(report.total, 6);
        assert!((report.accuracy - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_rows_include_costs() {
        let report = RunReport {
            reference_rows: 2,
            vocabulary: 4,
            query_rows: 3,
            evaluation: true,
            decisions: DecisionTally {
                accept_vector: 1,
                accept_fuzzy: 1,
                reject: 1,
            },
            elapsed: "12ms".into(),
            output: "out.csv".into(),
            cost: Some(CostReport {
                summary: [(1, 1), (2, -1)].into_iter().collect(),
                total: 1,
                accuracy: 0.5,
                unscored: 0,
            }),
        };
        let rows = report_rows(&report);
        let metrics: Vec<&str> = rows.iter().map(|r| r.metric.as_str()).collect();
        assert!(metrics.contains(&"cost 0"));
        assert!(metrics.contains(&"cost 1"));
        assert!(metrics.contains(&"total cost"));
        assert!(!metrics.contains(&"unscored rows"));
    }
}
