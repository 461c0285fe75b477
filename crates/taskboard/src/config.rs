//! CLI-side configuration: resolves the config file and applies global
//! flag overrides on top of `taskboard_config`.

use std::path::PathBuf;

use taskboard_config::Config;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Config file in effect: `--config` / `TASKBOARD_CONFIG`, else the
/// platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(taskboard_config::config_path)
}

/// Load the config file and environment, then apply CLI overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = taskboard_config::load_config_from(&config_path(global))?;

    if let Some(ref url) = global.base_url {
        cfg.base_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    if global.insecure {
        cfg.insecure = true;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Output format: `--output` wins over the config file.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    if let Some(format) = global.output {
        return format;
    }
    match cfg.output.as_str() {
        "json" => OutputFormat::Json,
        "json-compact" => OutputFormat::JsonCompact,
        "yaml" => OutputFormat::Yaml,
        "plain" => OutputFormat::Plain,
        _ => OutputFormat::Table,
    }
}
