//! Tunable import settings, loadable from a JSON config file

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::errors::CoreError;
use crate::parser::{Delimiters, ParseOptions, DEFAULT_DELIMITERS};

/// What to do when a statement cannot be delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and report the failing batch
    #[default]
    Abort,
    /// Log the failure, count the batch as failed and continue
    Skip,
}

/// Import tuning shared by the CLI and embedders
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub batch_size: NonZeroUsize,
    pub delimiters: String,
    pub lossy_utf8: bool,
    pub on_error: FailurePolicy,
    /// Extra delivery attempts per statement
    pub retries: u32,
    pub retry_delay_ms: u64,
    /// Database client used by the mysql sink
    pub mysql_bin: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delimiters: DEFAULT_DELIMITERS.to_string(),
            lossy_utf8: false,
            on_error: FailurePolicy::Abort,
            retries: 0,
            retry_delay_ms: 200,
            mysql_bin: "mysql".to_string(),
        }
    }
}

impl ImportConfig {
    pub fn parse_options(&self) -> Result<ParseOptions, CoreError> {
        Ok(ParseOptions {
            delimiters: Delimiters::parse(&self.delimiters)?,
            lossy_utf8: self.lossy_utf8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.batch_size.get(), 500);
        assert_eq!(config.on_error, FailurePolicy::Abort);
        let options = config.parse_options().unwrap();
        assert_eq!(options.delimiters.as_slice(), &[':', ';', '|']);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ImportConfig =
            serde_json::from_str(r#"{"batch_size": 1000, "on_error": "skip", "delimiters": ":"}"#)
                .unwrap();
        assert_eq!(config.batch_size.get(), 1000);
        assert_eq!(config.on_error, FailurePolicy::Skip);
        assert_eq!(config.delimiters, ":");
        assert_eq!(config.mysql_bin, "mysql");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let parsed: Result<ImportConfig, _> = serde_json::from_str(r#"{"batch_size": 0}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_empty_delimiters_rejected() {
        let config = ImportConfig {
            delimiters: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.parse_options(), Err(CoreError::NoDelimiters)));
    }
}
