//! Delimited-file I/O for reference sets, query sets and predictions
//!
//! The matching core never touches files; everything here converts between
//! CSV rows and in-memory records.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;

use crate::config::DataConfig;
use crate::cost::cost;
use crate::error::MatchError;
use crate::index::ReferenceEntity;
use crate::normalize::normalize;

/// One row of the query dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRecord {
    pub row_index: i64,
    pub raw_name: String,
    pub canonical_name: String,
    pub true_identifier: Option<i64>,
}

/// Predicted identifier for one query row; `-1` means no confident match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub row_index: i64,
    pub predicted_identifier: i64,
}

/// Loaded query rows plus the layout they came from
#[derive(Debug, Clone)]
pub struct QuerySet {
    pub index_column: String,
    /// Ground-truth identifiers are present
    pub evaluation: bool,
    pub records: Vec<QueryRecord>,
}

impl QuerySet {
    pub fn canonical_names(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.canonical_name.as_str())
            .collect()
    }
}

pub fn load_reference(path: &Path, data: &DataConfig) -> Result<Vec<ReferenceEntity>> {
    let mut reader = open_reader(path, data)?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers of {}", path.display()))?
        .clone();
    let id_idx = require_column(&headers, &data.id_column, path)?;
    let name_idx = require_column(&headers, &data.name_column, path)?;

    let mut entities = Vec::new();
    let mut skipped = 0usize;
    for (i, row) in reader.records().enumerate() {
        let row_no = i + 1;
        let record =
            row.with_context(|| format!("failed to read row {row_no} of {}", path.display()))?;

        let Some(identifier) = parse_int(field(&record, id_idx)) else {
            skipped += 1;
            log::warn!("{}", MatchError::malformed(row_no, &data.id_column));
            continue;
        };
        if field(&record, name_idx).is_none() {
            skipped += 1;
            log::warn!("{}", MatchError::malformed(row_no, &data.name_column));
            continue;
        }
        entities.push(ReferenceEntity::new(identifier, raw_field(&record, name_idx)));
    }

    log::info!(
        "loaded {} reference entities from {} ({} skipped)",
        entities.len(),
        path.display(),
        skipped
    );
    Ok(entities)
}

pub fn load_queries(path: &Path, data: &DataConfig) -> Result<QuerySet> {
    let mut reader = open_reader(path, data)?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers of {}", path.display()))?
        .clone();

    let (index_column, index_idx) = data
        .index_columns
        .iter()
        .find_map(|col| column_position(&headers, col).map(|pos| (col.clone(), pos)))
        .ok_or_else(|| {
            anyhow!(
                "{} has none of the index columns [{}]",
                path.display(),
                data.index_columns.join(", ")
            )
        })?;
    let name_idx = require_column(&headers, &data.name_column, path)?;
    let truth_idx = column_position(&headers, &data.id_column);

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row_no = i + 1;
        let record =
            row.with_context(|| format!("failed to read row {row_no} of {}", path.display()))?;

        let Some(row_index) = parse_int(field(&record, index_idx)) else {
            log::warn!("{}", MatchError::malformed(row_no, &index_column));
            continue;
        };
        let raw = raw_field(&record, name_idx);
        let true_identifier = truth_idx.and_then(|idx| parse_int(field(&record, idx)));
        if truth_idx.is_some() && true_identifier.is_none() {
            log::debug!("row {row_no}: no ground truth, cost left blank");
        }

        records.push(QueryRecord {
            row_index,
            raw_name: raw.to_string(),
            canonical_name: normalize(Some(raw)),
            true_identifier,
        });
    }

    log::info!(
        "loaded {} queries from {} ({} mode)",
        records.len(),
        path.display(),
        if truth_idx.is_some() {
            "evaluation"
        } else {
            "inference"
        }
    );
    Ok(QuerySet {
        index_column,
        evaluation: truth_idx.is_some(),
        records,
    })
}

/// Write one output row per query, in query order.
pub fn write_predictions(
    path: &Path,
    queries: &QuerySet,
    results: &[MatchResult],
    data: &DataConfig,
) -> Result<()> {
    if queries.records.len() != results.len() {
        return Err(anyhow!(
            "{} queries but {} results",
            queries.records.len(),
            results.len()
        ));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut writer = WriterBuilder::new()
        .delimiter(data.delimiter_byte()?)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let pred_column = format!("{}_pred", data.id_column);
    if queries.evaluation {
        writer.write_record([
            queries.index_column.as_str(),
            data.name_column.as_str(),
            data.id_column.as_str(),
            pred_column.as_str(),
            "cost",
        ])?;
    } else {
        writer.write_record([queries.index_column.as_str(), pred_column.as_str()])?;
    }

    for (query, result) in queries.records.iter().zip(results) {
        if query.row_index != result.row_index {
            return Err(anyhow!(
                "result for row {} written at row {}",
                result.row_index,
                query.row_index
            ));
        }
        let row_index = query.row_index.to_string();
        let predicted = result.predicted_identifier.to_string();
        if queries.evaluation {
            let truth = query
                .true_identifier
                .map(|t| t.to_string())
                .unwrap_or_default();
            let row_cost = query
                .true_identifier
                .map(|t| cost(t, result.predicted_identifier).to_string())
                .unwrap_or_default();
            writer.write_record([
                row_index.as_str(),
                query.raw_name.as_str(),
                truth.as_str(),
                predicted.as_str(),
                row_cost.as_str(),
            ])?;
        } else {
            writer.write_record([row_index.as_str(), predicted.as_str()])?;
        }
    }

    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn open_reader(path: &Path, data: &DataConfig) -> Result<csv::Reader<fs::File>> {
    ReaderBuilder::new()
        .delimiter(data.delimiter_byte()?)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

fn column_position(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn require_column(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    column_position(headers, name)
        .ok_or_else(|| anyhow!("{} is missing column `{}`", path.display(), name))
}

/// Trimmed, non-empty field value
fn field(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|v| !v.is_empty())
}

/// Cell exactly as it appears in the file
fn raw_field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or_default()
}

/// Integers may arrive float-formatted ("42.0") from spreadsheet exports.
fn parse_int(value: Option<&str>) -> Option<i64> {
    let value = value?;
    if let Ok(v) = value.parse::<i64>() {
        return Some(v);
    }
    let f = value.parse::<f64>().ok()?;
    let in_range = f.abs() < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}
