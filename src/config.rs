//! Configuration management for cmatch
//!
//! Supports:
//! - TOML config file at XDG locations
//! - Environment variable overrides (`CMATCH__SECTION__KEY`)
//! - Command-line argument overrides

use std::env;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat};
use env_logger::fmt::WriteStyle;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::{CoreResult, MatchError};
use crate::resolver::{Thresholds, CANDIDATES, FUZZY_ACCEPT, HIGH_CONFIDENCE};
use crate::vectorizer::{VectorizerParams, DEFAULT_MAX_FEATURES};

const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Runtime context containing resolved configuration
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    pub global: GlobalOpts,
    pub config: AppConfig,
    config_path: PathBuf,
}

impl RuntimeContext {
    pub fn new(global: &GlobalOpts) -> Result<Self> {
        let config_path = resolve_config_path(global.config.as_ref())?;
        let config = load_config(&config_path, global)?;

        Ok(Self {
            global: global.clone(),
            config,
            config_path,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn init_logging(&self) -> Result<()> {
        if self.global.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }

        let mut builder = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(&self.config.logging.level),
        );

        if let Some(level) = self.cli_log_level() {
            builder.filter_level(level);
        }

        let force_color = env::var_os("FORCE_COLOR").is_some();
        let disable_color = self.global.no_color
            || env::var_os("NO_COLOR").is_some()
            || (!force_color && !std::io::stderr().is_terminal());

        if disable_color {
            builder.write_style(WriteStyle::Never);
        } else if force_color {
            builder.write_style(WriteStyle::Always);
        } else {
            builder.write_style(WriteStyle::Auto);
        }

        builder.try_init().or_else(|err| {
            if self.global.verbose > 0 {
                eprintln!("logger already initialized: {err}");
            }
            Ok(())
        })
    }

    /// Level forced by command-line flags; `None` defers to RUST_LOG and the
    /// configured `logging.level`.
    fn cli_log_level(&self) -> Option<LevelFilter> {
        if self.global.trace {
            Some(LevelFilter::Trace)
        } else if self.global.debug {
            Some(LevelFilter::Debug)
        } else {
            match self.global.verbose {
                0 => None,
                1 => Some(LevelFilter::Info),
                2 => Some(LevelFilter::Debug),
                _ => Some(LevelFilter::Trace),
            }
        }
    }

    /// Get the effective output format
    pub fn output_format(&self) -> OutputFormat {
        if self.global.json {
            return OutputFormat::Json;
        }
        self.global
            .output_format
            .unwrap_or(match self.config.output.format.as_str() {
                "json" => OutputFormat::Json,
                "yaml" => OutputFormat::Yaml,
                "table" => OutputFormat::Table,
                _ => OutputFormat::Auto,
            })
    }
}

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub matching: MatchingConfig,
    pub index: IndexConfig,
    pub data: DataConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Cosine similarity that accepts the top candidate without rescoring
    pub high_confidence: f64,
    /// Minimum token-sort score (0-100) for a rescored candidate
    pub fuzzy_accept: f64,
    /// Candidates retrieved per query
    pub candidates: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            high_confidence: HIGH_CONFIDENCE,
            fuzzy_accept: FUZZY_ACCEPT,
            candidates: CANDIDATES,
        }
    }
}

impl MatchingConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            high_confidence: self.high_confidence,
            fuzzy_accept: self.fuzzy_accept,
            candidates: self.candidates,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub max_features: usize,
    pub ngram_min: usize,
    pub ngram_max: usize,
    pub stop_words: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        let params = VectorizerParams::default();
        Self {
            max_features: params.max_features,
            ngram_min: params.ngram_min,
            ngram_max: params.ngram_max,
            stop_words: params.stop_words,
        }
    }
}

impl IndexConfig {
    pub fn vectorizer_params(&self) -> VectorizerParams {
        VectorizerParams {
            max_features: self.max_features,
            ngram_min: self.ngram_min,
            ngram_max: self.ngram_max,
            stop_words: self.stop_words,
        }
    }
}

/// Layout of the delimited input and output files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub delimiter: String,
    /// Identifier column in the reference file, and ground truth in queries
    pub id_column: String,
    pub name_column: String,
    /// Candidate row-index headers for query files, first present wins
    pub index_columns: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            delimiter: "|".to_string(),
            id_column: "company_id".to_string(),
            name_column: "name".to_string(),
            index_columns: vec![
                "row_index".to_string(),
                "train_index".to_string(),
                "test_index".to_string(),
            ],
        }
    }
}

impl DataConfig {
    pub fn delimiter_byte(&self) -> CoreResult<u8> {
        match self.delimiter.as_bytes() {
            [b] => Ok(*b),
            _ => Err(MatchError::InvalidParameter(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub no_headers: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "auto".to_string(),
            no_headers: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

fn resolve_config_path(override_path: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        let expanded = expand_path(path)?;
        if expanded.is_dir() {
            return Ok(expanded.join("config.toml"));
        }
        return Ok(expanded);
    }

    Ok(default_config_dir()?.join("config.toml"))
}

fn load_config(config_path: &Path, global: &GlobalOpts) -> Result<AppConfig> {
    // Create default config if it doesn't exist
    if !config_path.exists() {
        write_default_config(config_path)?;
    }

    let mut app_config = build_config(config_path)?;

    // Apply CLI overrides
    if global.no_headers {
        app_config.output.no_headers = true;
    }

    app_config.validate()?;
    Ok(app_config)
}

fn build_config(config_path: &Path) -> Result<AppConfig> {
    let config = Config::builder()
        .set_default("matching.high_confidence", HIGH_CONFIDENCE)?
        .set_default("matching.fuzzy_accept", FUZZY_ACCEPT)?
        .set_default("matching.candidates", CANDIDATES as i64)?
        .set_default("index.max_features", DEFAULT_MAX_FEATURES as i64)?
        .set_default("index.ngram_min", 1_i64)?
        .set_default("index.ngram_max", 3_i64)?
        .set_default("index.stop_words", true)?
        .set_default("data.delimiter", "|")?
        .set_default("data.id_column", "company_id")?
        .set_default("data.name_column", "name")?
        .set_default(
            "data.index_columns",
            vec!["row_index", "train_index", "test_index"],
        )?
        .set_default("output.format", "auto")?
        .set_default("output.no_headers", false)?
        .set_default("logging.level", "warn")?
        // Load from file
        .add_source(
            File::from(config_path)
                .format(FileFormat::Toml)
                .required(false),
        )
        // Environment variable overrides (CMATCH__*)
        .add_source(
            Environment::with_prefix("CMATCH")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    config
        .try_deserialize()
        .with_context(|| format!("invalid configuration in {}", config_path.display()))
}

impl AppConfig {
    pub fn validate(&self) -> CoreResult<()> {
        self.matching.thresholds().validate()?;
        self.index.vectorizer_params().validate()?;
        self.data.delimiter_byte()?;
        Ok(())
    }
}

pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }

    let config = AppConfig::default();
    let toml = toml::to_string_pretty(&config).context("serializing default config")?;

    let content = format!(
        "# cmatch configuration\n\
        # File: {}\n\
        #\n\
        # Environment variables:\n\
        #   CMATCH_CONFIG - Alternate config file path\n\
        #   CMATCH__*     - Override any config value (e.g., CMATCH__MATCHING__FUZZY_ACCEPT=90)\n\
        \n\
        {toml}",
        path.display()
    );

    fs::write(path, content).with_context(|| format!("writing config to {}", path.display()))
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    if let Some(text) = path.to_str() {
        let expanded = shellexpand::full(text).context("expanding path")?;
        Ok(PathBuf::from(expanded.to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn default_config_dir() -> Result<PathBuf> {
    // Check XDG_CONFIG_HOME first
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    // Use platform-specific config directory
    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    // Fallback to ~/.config
    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}
