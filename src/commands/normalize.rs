//! Print canonical forms

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::config::RuntimeContext;
use crate::normalize::normalize_str;
use crate::output::print_table;

#[derive(Debug, Serialize, Tabled)]
struct NormalizedRow {
    raw: String,
    canonical: String,
}

pub fn run(ctx: &RuntimeContext, names: &[String]) -> Result<()> {
    let rows: Vec<NormalizedRow> = names
        .iter()
        .map(|raw| NormalizedRow {
            raw: raw.clone(),
            canonical: normalize_str(raw),
        })
        .collect();
    print_table(ctx, &rows)
}
