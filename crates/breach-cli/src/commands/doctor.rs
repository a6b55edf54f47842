//! Doctor command - check that an import can run

use anyhow::Result;
use breach_importer::{CorpusWalker, ImportJournal};
use std::path::Path;
use std::process::{Command, ExitCode};

use crate::cli::{Cli, OutputFormat, SinkKind};
use crate::commands::import::journal_path;
use crate::output::colors;
use crate::settings;

/// Status for diagnostic checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
        }
    }
}

struct Check {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

pub fn run(cli: &Cli) -> Result<ExitCode> {
    let mut checks = vec![check_config(cli), check_corpus(cli.path.as_deref())];

    let mysql_bin = settings::load_config(cli)
        .map(|c| c.mysql_bin)
        .unwrap_or_else(|_| "mysql".to_string());
    checks.push(check_client(&mysql_bin, cli.sink == SinkKind::Mysql));
    checks.push(check_journal(cli));

    let failed = checks.iter().any(|c| c.status == CheckStatus::Fail);

    match cli.effective_format() {
        OutputFormat::Human => {
            println!("{}", colors::header("Import Doctor"));
            println!();
            for check in &checks {
                let status = match check.status {
                    CheckStatus::Pass => colors::success(check.name),
                    CheckStatus::Warn => colors::warning(check.name),
                    CheckStatus::Fail => colors::error(check.name),
                };
                println!("  {} - {}", status, check.details);
            }
            println!();
            if failed {
                println!("{}", colors::error("Some checks failed"));
            } else {
                println!("{}", colors::success("Ready to import"));
            }
        }

        OutputFormat::Json => {
            let output = serde_json::json!({
                "checks": checks.iter().map(|c| serde_json::json!({
                    "name": c.name,
                    "status": c.status.as_str(),
                    "details": c.details
                })).collect::<Vec<_>>(),
                "all_passed": !failed
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        OutputFormat::Minimal => {
            if failed {
                for c in checks.iter().filter(|c| c.status == CheckStatus::Fail) {
                    println!("FAIL: {}", c.name);
                }
            } else {
                println!("ok");
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn check_config(cli: &Cli) -> Check {
    match (&cli.config, settings::load_config(cli)) {
        (None, _) => Check {
            name: "Config file",
            status: CheckStatus::Pass,
            details: "none given, using defaults".to_string(),
        },
        (Some(path), Ok(config)) => Check {
            name: "Config file",
            status: CheckStatus::Pass,
            details: format!(
                "{} (batch size {})",
                path.display(),
                config.batch_size
            ),
        },
        (Some(_), Err(e)) => Check {
            name: "Config file",
            status: CheckStatus::Fail,
            details: format!("{:#}", e),
        },
    }
}

fn check_corpus(path: Option<&Path>) -> Check {
    let Some(path) = path else {
        return Check {
            name: "Corpus root",
            status: CheckStatus::Warn,
            details: "--path not given".to_string(),
        };
    };
    match CorpusWalker::new(path) {
        Ok(walker) => {
            let has_files = walker.files().next().is_some();
            Check {
                name: "Corpus root",
                status: if has_files {
                    CheckStatus::Pass
                } else {
                    CheckStatus::Warn
                },
                details: if has_files {
                    format!("{} is readable", path.display())
                } else {
                    format!("{} contains no files", path.display())
                },
            }
        }
        Err(e) => Check {
            name: "Corpus root",
            status: CheckStatus::Fail,
            details: e.to_string(),
        },
    }
}

fn check_client(program: &str, required: bool) -> Check {
    match Command::new(program).arg("--version").output() {
        Ok(output) if output.status.success() => Check {
            name: "mysql client",
            status: CheckStatus::Pass,
            details: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        },
        result => Check {
            name: "mysql client",
            status: if required {
                CheckStatus::Fail
            } else {
                CheckStatus::Warn
            },
            details: match result {
                Ok(output) => format!("{} --version exited with {}", program, output.status),
                Err(e) => format!("{} not runnable: {}", program, e),
            },
        },
    }
}

fn check_journal(cli: &Cli) -> Check {
    let Some(path) = journal_path(cli) else {
        return Check {
            name: "Journal",
            status: CheckStatus::Pass,
            details: "disabled (no --journal or --resume)".to_string(),
        };
    };
    if !path.exists() {
        return Check {
            name: "Journal",
            status: CheckStatus::Warn,
            details: format!("{} will be created", path.display()),
        };
    }
    match ImportJournal::open(&path).and_then(|j| j.import_count()) {
        Ok(count) => Check {
            name: "Journal",
            status: CheckStatus::Pass,
            details: format!("{} ({} imports recorded)", path.display(), count),
        },
        Err(e) => Check {
            name: "Journal",
            status: CheckStatus::Fail,
            details: format!("{}: {}", path.display(), e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_checks() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(check_corpus(None).status, CheckStatus::Warn);
        assert_eq!(check_corpus(Some(tmp.path())).status, CheckStatus::Warn);
        assert_eq!(
            check_corpus(Some(tmp.path().join("missing").as_path())).status,
            CheckStatus::Fail
        );

        std::fs::write(tmp.path().join("a.txt"), "a@b.io:x").unwrap();
        assert_eq!(check_corpus(Some(tmp.path())).status, CheckStatus::Pass);
    }

    #[test]
    fn test_missing_client_severity_depends_on_sink() {
        assert_eq!(
            check_client("/nonexistent/mysql", true).status,
            CheckStatus::Fail
        );
        assert_eq!(
            check_client("/nonexistent/mysql", false).status,
            CheckStatus::Warn
        );
    }
}
