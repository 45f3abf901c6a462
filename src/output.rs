//! Output formatting utilities
//!
//! Handles JSON, YAML, and table output formats.

use std::io::IsTerminal;

use anyhow::Result;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::OutputFormat;
use crate::config::RuntimeContext;

/// Format and print data according to the configured output format
pub fn print_output<T: Serialize>(ctx: &RuntimeContext, data: &T) -> Result<()> {
    let output = format_output(ctx.output_format(), data)?;
    println!("{output}");
    Ok(())
}

/// Format structured data; table-less types fall back to JSON
pub fn format_output<T: Serialize>(format: OutputFormat, data: &T) -> Result<String> {
    let is_tty = std::io::stdout().is_terminal();

    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        OutputFormat::Auto if !is_tty => Ok(serde_json::to_string(data)?),
        _ if is_tty => Ok(serde_json::to_string_pretty(data)?),
        _ => Ok(serde_json::to_string(data)?),
    }
}

/// Table output is used for `table`, and for `auto` on a terminal
pub fn wants_table(ctx: &RuntimeContext) -> bool {
    match ctx.output_format() {
        OutputFormat::Table => true,
        OutputFormat::Auto => std::io::stdout().is_terminal(),
        _ => false,
    }
}

/// Print rows as a table, or serialize them when a machine format is wanted
pub fn print_table<T: Tabled + Serialize>(ctx: &RuntimeContext, items: &[T]) -> Result<()> {
    if !wants_table(ctx) {
        return print_output(ctx, &items);
    }

    let no_headers = ctx.global.no_headers || ctx.config.output.no_headers;
    println!("{}", build_table(items, no_headers));
    Ok(())
}

fn build_table<T: Tabled>(items: &[T], no_headers: bool) -> Table {
    let mut table = Table::new(items);
    table.with(Style::sharp());

    if no_headers {
        table.with(tabled::settings::Remove::row(
            tabled::settings::object::Rows::first(),
        ));
    }

    table
}

/// Format a score to a fixed number of decimals for display
pub fn format_score(score: f64, decimals: usize) -> String {
    format!("{score:.decimals$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled, Serialize)]
    struct Row {
        name: &'static str,
        id: i64,
    }

    #[test]
    fn test_build_table_headers() {
        let rows = [Row { name: "acme inc", id: 1 }];
        let with = build_table(&rows, false).to_string();
        assert!(with.contains("name"));
        assert!(with.contains("acme inc"));

        let without = build_table(&rows, true).to_string();
        assert!(!without.contains("name"));
        assert!(without.contains("acme inc"));
    }

    #[test]
    fn test_yaml_output() {
        let rows = vec![Row { name: "globex", id: 2 }];
        let out = format_output(OutputFormat::Yaml, &rows).unwrap();
        assert!(out.contains("name: globex"));
        assert!(out.contains("id: 2"));
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.816496, 3), "0.816");
        assert_eq!(format_score(100.0, 1), "100.0");
    }
}
