//! `cmatch config` subcommands

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use crate::cli::ConfigCommand;
use crate::config::{self as app_config, AppConfig, RuntimeContext};
use crate::output::{print_output, wants_table};

pub fn run(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Path => {
            println!("{}", ctx.config_path().display());
            Ok(())
        }
        ConfigCommand::Get { key: Some(key) } => {
            println!("{}", get_config_value(&ctx.config, &key)?);
            Ok(())
        }
        ConfigCommand::Get { key: None } => show(ctx),
        ConfigCommand::Reset => reset(ctx),
    }
}

/// Effective configuration; TOML on a terminal, the chosen format otherwise
fn show(ctx: &RuntimeContext) -> Result<()> {
    if wants_table(ctx) {
        let toml = toml::to_string_pretty(&ctx.config).context("serializing configuration")?;
        print!("{toml}");
        return Ok(());
    }
    print_output(ctx, &ctx.config)
}

fn reset(ctx: &RuntimeContext) -> Result<()> {
    app_config::write_default_config(ctx.config_path())?;
    log::info!("wrote default configuration");
    println!(
        "Configuration reset to defaults at: {}",
        ctx.config_path().display()
    );
    Ok(())
}

/// Look up a dot-separated key such as `matching.fuzzy_accept`
fn get_config_value(config: &AppConfig, key: &str) -> Result<String> {
    let json = serde_json::to_value(config)?;
    let value = key
        .split('.')
        .try_fold(&json, |node, part| node.get(part))
        .ok_or_else(|| anyhow!("unknown configuration key `{key}`"))?;

    Ok(match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_value() {
        let config = AppConfig::default();

        assert_eq!(
            get_config_value(&config, "matching.fuzzy_accept").unwrap(),
            "92.0"
        );
        assert_eq!(get_config_value(&config, "matching.candidates").unwrap(), "2");
        assert_eq!(get_config_value(&config, "data.delimiter").unwrap(), "|");
        assert_eq!(
            get_config_value(&config, "data.index_columns").unwrap(),
            r#"["row_index","train_index","test_index"]"#
        );
        assert!(get_config_value(&config, "nonexistent.key").is_err());
    }
}
