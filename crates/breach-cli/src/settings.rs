//! Resolve import settings from the config file and CLI flags

use anyhow::{Context, Result};
use breach_core::{FailurePolicy, ImportConfig};

use crate::cli::{Cli, OnError};

/// Load the JSON config (if any) and apply explicit CLI flags on top
pub fn load_config(cli: &Cli) -> Result<ImportConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .context(format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str::<ImportConfig>(&content)
                .context(format!("Failed to parse config {}", path.display()))?
        }
        None => ImportConfig::default(),
    };

    if let Some(size) = cli.batch_size {
        config.batch_size = size;
    }
    if let Some(delimiters) = &cli.delimiters {
        config.delimiters = delimiters.clone();
    }
    if cli.lossy_utf8 {
        config.lossy_utf8 = true;
    }
    if let Some(on_error) = cli.on_error {
        config.on_error = match on_error {
            OnError::Abort => FailurePolicy::Abort,
            OnError::Skip => FailurePolicy::Skip,
        };
    }
    if let Some(retries) = cli.retries {
        config.retries = retries;
    }
    if let Some(bin) = &cli.mysql_bin {
        config.mysql_bin = bin.clone();
    }

    Ok(config)
}
