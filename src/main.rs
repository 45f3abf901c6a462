//! cmatch - resolve noisy company names to canonical reference identifiers
//!
//! Retrieves the nearest reference names by TF-IDF cosine similarity, then
//! falls back to token-sort fuzzy rescoring when the vector match is weak.

mod cli;
mod commands;
mod config;
mod cost;
mod dataset;
mod error;
mod fuzzy;
mod index;
mod normalize;
mod output;
mod resolver;
mod stop_words;
mod vectorizer;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::RuntimeContext;

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(io::stderr(), "Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = RuntimeContext::new(&cli.global)?;
    ctx.init_logging()?;

    log::debug!("Config loaded from: {:?}", ctx.config_path());

    run_command(&ctx, cli.command)
}

fn run_command(ctx: &RuntimeContext, command: Command) -> Result<()> {
    match command {
        Command::Match(args) => commands::match_cmd::run(ctx, args),
        Command::Lookup(args) => commands::lookup::run(ctx, args),
        Command::Normalize { names } => commands::normalize::run(ctx, &names),
        Command::Config { command } => commands::config::run(ctx, command),
        Command::Completions { shell } => commands::completions::run(shell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_match_command() {
        let cli = Cli::try_parse_from([
            "cmatch",
            "match",
            "--reference",
            "g.csv",
            "--query",
            "s.csv",
            "--output",
            "out.csv",
            "--threshold",
            "0.9",
            "--candidates",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Match(args) => {
                assert_eq!(args.reference.to_str(), Some("g.csv"));
                assert_eq!(args.overrides.threshold, Some(0.9));
                assert_eq!(args.overrides.candidates, Some(3));
                assert_eq!(args.overrides.fuzzy_threshold, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_normalize_requires_a_name() {
        assert!(Cli::try_parse_from(["cmatch", "normalize"]).is_err());
    }
}
