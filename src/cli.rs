//! CLI argument parsing and command definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Resolve noisy company names to canonical reference identifiers
#[derive(Debug, Parser)]
#[command(
    name = "cmatch",
    author,
    version,
    about = "Resolve noisy company names to canonical reference identifiers",
    propagate_version = true,
    after_help = "Use 'cmatch <command> --help' for more information about a command."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,
    #[command(subcommand)]
    pub command: Command,
}

/// Global options available to all commands
#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Output format (json, yaml, table, auto)
    #[arg(
        short = 'o',
        long = "format",
        value_enum,
        global = true,
        conflicts_with = "json"
    )]
    pub output_format: Option<OutputFormat>,

    /// Output as JSON (shorthand for -o json)
    #[arg(long, global = true)]
    pub json: bool,

    /// Override config file path
    #[arg(long, value_name = "PATH", env = "CMATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Reduce output to only errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase logging verbosity (stackable: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Enable debug logging (equivalent to -vv)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Enable trace logging
    #[arg(long, global = true)]
    pub trace: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Hide table headers
    #[arg(long, global = true)]
    pub no_headers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[non_exhaustive]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
    Auto,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve every row of a query file against a reference file
    Match(MatchArgs),

    /// Show the retrieved candidates and decision for a single name
    Lookup(LookupArgs),

    /// Print the canonical form of one or more names
    Normalize {
        /// Raw company names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Inspect and manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Matcher knobs shared by `match` and `lookup`; unset values come from config
#[derive(Debug, Clone, Default, Args)]
pub struct MatcherOverrides {
    /// Cosine similarity that accepts the top candidate outright (0-1)
    #[arg(long, value_name = "F")]
    pub threshold: Option<f64>,

    /// Minimum fuzzy score for a rescored candidate (0-100)
    #[arg(long = "fuzzy-threshold", value_name = "F")]
    pub fuzzy_threshold: Option<f64>,

    /// Candidates retrieved per query
    #[arg(long, value_name = "K")]
    pub candidates: Option<usize>,
}

#[derive(Debug, Args)]
pub struct MatchArgs {
    /// Reference file with identifier and name columns
    #[arg(short, long, value_name = "PATH")]
    pub reference: PathBuf,

    /// Query file with a row index, a name and optionally ground truth
    #[arg(short = 'i', long, value_name = "PATH")]
    pub query: PathBuf,

    /// Where to write predictions
    #[arg(short = 'O', long = "output", value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub overrides: MatcherOverrides,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Reference file with identifier and name columns
    #[arg(short, long, value_name = "PATH")]
    pub reference: PathBuf,

    /// Raw company name to look up
    pub name: String,

    /// Number of candidates to show (defaults to the configured count)
    #[arg(short, long, value_name = "K")]
    pub k: Option<usize>,

    #[command(flatten)]
    pub overrides: MatcherOverrides,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show effective configuration
    Show,

    /// Print config file path
    Path,

    /// Get a specific configuration value
    Get {
        /// Configuration key (dot-separated path)
        key: Option<String>,
    },

    /// Reset configuration to defaults
    Reset,
}
