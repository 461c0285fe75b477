//! Config subcommand handlers.

use taskboard_config::{Config, save_config_to};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Keys `config set` accepts.
const SETTABLE_KEYS: &[&str] = &[
    "base_url",
    "output",
    "timeout",
    "insecure",
    "ca_cert",
    "token_storage",
    "token_file",
    "search_debounce_ms",
    "recently_successful_ms",
];

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path(global);
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            output::print_output(&render(&cfg)?, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let cfg = taskboard_config::load_config_from(&path)?;
            let updated = set_key(&cfg, &key, &value)?;
            save_config_to(&updated, &path)?;
            output::print_status(&format!("{key} saved to {}", path.display()), global.quiet);
            Ok(())
        }
    }
}

fn render(cfg: &Config) -> Result<String, CliError> {
    toml::to_string_pretty(cfg).map_err(|e| CliError::Validation {
        field: "config".into(),
        reason: e.to_string(),
    })
}

/// Interpret a command-line value as the most specific TOML scalar.
fn parse_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return toml::Value::Integer(n);
    }
    toml::Value::String(raw.to_owned())
}

fn set_key(cfg: &Config, key: &str, value: &str) -> Result<Config, CliError> {
    if !SETTABLE_KEYS.contains(&key) {
        return Err(CliError::Validation {
            field: key.into(),
            reason: format!("unknown key; expected one of {}", SETTABLE_KEYS.join(", ")),
        });
    }
    let invalid = |reason: String| CliError::Validation {
        field: key.into(),
        reason,
    };

    let toml::Value::Table(mut table) =
        toml::Value::try_from(cfg).map_err(|e| invalid(e.to_string()))?
    else {
        return Err(invalid("config does not serialize to a table".into()));
    };
    // Paths and URLs stay strings even when they look numeric.
    let value = match key {
        "base_url" | "ca_cert" | "token_file" | "output" | "token_storage" => {
            toml::Value::String(value.to_owned())
        }
        _ => parse_value(value),
    };
    table.insert(key.to_owned(), value);

    let updated: Config = toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| invalid(e.to_string()))?;
    updated.validate()?;
    Ok(updated)
}
