//! TOML configuration for the demo host.
//!
//! Loaded the same way `ai00-server`'s `load_config` loads its config: an
//! async file read followed by `toml::from_str`.

use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};

/// Everything the CLI needs that isn't worth typing out as a flag every run.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to a `tokenizers`-format `tokenizer.json`.
    pub tokenizer_path: String,
    /// Token budget handed to `Generator` when `--budget` isn't given.
    #[serde(default = "default_budget")]
    pub default_budget: usize,
    /// `tracing_subscriber` env-filter directive, e.g. `"info"` or `"schema_gen_cli=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_budget() -> usize {
    512
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load a configuration file from the given path.
pub async fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let file = File::open(path).await?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents).await?;
    Ok(toml::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_when_omitted() {
        let config: Config = toml::from_str(r#"tokenizer_path = "tokenizer.json""#).unwrap();
        assert_eq!(config.default_budget, 512);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: Config = toml::from_str(
            r#"
            tokenizer_path = "tokenizer.json"
            default_budget = 128
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_budget, 128);
        assert_eq!(config.log_level, "debug");
    }
}
