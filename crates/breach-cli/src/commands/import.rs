//! Import command - stream the corpus into the chosen sink

use anyhow::{Context, Result};
use breach_core::{CoreError, StatementBuilder};
use breach_importer::{
    default_journal_path, run_import, BatchStatus, CorpusWalker, DeliveryPolicy, ExecutionSink, ImportError,
    ImportJournal, ImportRequest, MysqlClientSink, StatementFileSink, Target,
};
use secrecy::SecretString;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

use crate::cli::{Cli, OutputFormat, SinkKind};
use crate::output::{colors, human, json, minimal};
use crate::settings;

/// Exit code when the run finished but some batches were skipped
const EXIT_PARTIAL: u8 = 2;

pub fn run(cli: &Cli) -> Result<ExitCode> {
    let root = mandatory(&cli.path, "path")?;
    let database = mandatory(&cli.database, "database")?;
    let table = mandatory(&cli.table, "table")?;

    // Fail before a journal or output file gets created
    CorpusWalker::new(root)?;
    StatementBuilder::new(table.as_str())?;

    let config = settings::load_config(cli)?;
    let parse = config
        .parse_options()
        .context("Invalid import settings")?;

    let request = ImportRequest {
        root: root.clone(),
        database: database.clone(),
        table: table.clone(),
        batch_size: config.batch_size,
        parse,
        policy: DeliveryPolicy::from_config(&config),
        resume: cli.resume,
    };
    debug!(
        batch_size = config.batch_size.get(),
        delimiters = %config.delimiters,
        lossy_utf8 = config.lossy_utf8,
        on_error = ?config.on_error,
        retries = config.retries,
        "resolved import settings"
    );

    let journal = match journal_path(cli) {
        Some(path) => {
            info!(journal = %path.display(), resume = cli.resume, "using resume journal");
            Some(
                ImportJournal::open(&path)
                    .context(format!("Failed to open journal {}", path.display()))?,
            )
        }
        None => None,
    };

    let mut sink = build_sink(cli, &config.mysql_bin, database)?;
    let sink_name = sink.describe();
    info!(sink = %sink_name, "delivering statements");

    let format = cli.effective_format();
    let show_progress = format == OutputFormat::Human && atty::is(atty::Stream::Stderr);
    let summary = run_import(&request, sink.as_mut(), journal.as_ref(), |progress, status| {
        if show_progress {
            let marker = match status {
                BatchStatus::Delivered => "",
                BatchStatus::Skipped => " (last batch skipped)",
            };
            eprint!(
                "\r  {} records processed{}    ",
                colors::format_count(progress.end_offset()),
                marker
            );
        }
    });
    if show_progress {
        eprintln!();
    }
    let summary = summary.map_err(|e| {
        let context = failure_context(&e);
        anyhow::Error::new(e).context(context)
    })?;

    let rendered = match format {
        OutputFormat::Human => human::format_summary(&summary, &sink_name),
        OutputFormat::Json => serde_json::to_string_pretty(&json::format_summary(&summary, &sink_name))?,
        OutputFormat::Minimal => minimal::format_summary(&summary),
    };
    // Statements own stdout when they are printed there
    if cli.sink == SinkKind::Stdout {
        eprintln!("{}", rendered);
    } else {
        println!("{}", rendered);
    }

    if summary.batches_failed > 0 {
        Ok(ExitCode::from(EXIT_PARTIAL))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn failure_context(err: &ImportError) -> &'static str {
    match err {
        ImportError::Core(CoreError::Encoding { .. }) => {
            "Import failed (rerun with --lossy-utf8 to replace invalid bytes)"
        }
        _ => "Import failed",
    }
}

fn mandatory<'a, T>(value: &'a Option<T>, name: &str) -> Result<&'a T> {
    value
        .as_ref()
        .with_context(|| format!("Argument --{} is mandatory", name))
}

/// Explicit journal, or the default one when resuming
pub fn journal_path(cli: &Cli) -> Option<PathBuf> {
    match (&cli.journal, cli.resume) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(default_journal_path()),
        (None, false) => None,
    }
}

fn build_sink(cli: &Cli, mysql_bin: &str, database: &str) -> Result<Box<dyn ExecutionSink>> {
    let sink: Box<dyn ExecutionSink> = match cli.sink {
        SinkKind::Mysql => {
            let mut target = Target::new(database);
            if let Some(user) = &cli.user {
                target = target.with_user(user.as_str());
            }
            if let Some(password) = &cli.password {
                target = target.with_password(SecretString::new(password.clone()));
            }
            if let Some(host) = &cli.host {
                target = target.with_host(host.as_str());
            }
            if let Some(port) = cli.port {
                target = target.with_port(port);
            }
            Box::new(MysqlClientSink::new(mysql_bin, target))
        }
        SinkKind::File => {
            let path = mandatory(&cli.output, "output")?;
            Box::new(
                StatementFileSink::create(path)
                    .context(format!("Failed to create {}", path.display()))?,
            )
        }
        SinkKind::Stdout => Box::new(StatementFileSink::stdout()),
    };
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["breach-import", "--path=/data", "--database=db", "--table=t"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_journal_path_resolution() {
        assert_eq!(journal_path(&parse(&[])), None);
        assert_eq!(
            journal_path(&parse(&["--journal=/tmp/j.db"])),
            Some(PathBuf::from("/tmp/j.db"))
        );
        assert_eq!(journal_path(&parse(&["--resume"])), Some(default_journal_path()));
    }

    #[test]
    fn test_file_import_writes_statements() {
        let tmp = tempfile::tempdir().unwrap();
        let corpus = tmp.path().join("corpus");
        std::fs::create_dir_all(&corpus).unwrap();
        std::fs::write(
            corpus.join("a.txt"),
            "alice@example.com:pw1\nnotanemail:pw2\n",
        )
        .unwrap();
        std::fs::write(corpus.join("b.txt"), "bob@test.org;pw3").unwrap();
        let out = tmp.path().join("out.sql");

        let cli = Cli::try_parse_from([
            "breach-import".to_string(),
            format!("--path={}", corpus.display()),
            "--database=db".to_string(),
            "--table=t".to_string(),
            "--sink=file".to_string(),
            format!("--output={}", out.display()),
            "--batch-size=2".to_string(),
            "--format=minimal".to_string(),
        ])
        .unwrap();

        let code = run(&cli).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "INSERT INTO t(user, pass) VALUES ('alice@example.com','pw1'),('bob@test.org','pw3');\n"
        );
    }

    #[test]
    fn test_encoding_failure_suggests_lossy_flag() {
        let tmp = tempfile::tempdir().unwrap();
        let corpus = tmp.path().join("corpus");
        std::fs::create_dir_all(&corpus).unwrap();
        std::fs::write(corpus.join("a.txt"), b"a@x.io:\xff\n".as_slice()).unwrap();
        let out = tmp.path().join("out.sql");

        let args = |extra: &[&str]| {
            let mut args = vec![
                "breach-import".to_string(),
                format!("--path={}", corpus.display()),
                "--database=db".to_string(),
                "--table=t".to_string(),
                "--sink=file".to_string(),
                format!("--output={}", out.display()),
                "--format=minimal".to_string(),
            ];
            args.extend(extra.iter().map(|s| s.to_string()));
            Cli::try_parse_from(args).unwrap()
        };

        let message = format!("{:#}", run(&args(&[])).unwrap_err());
        assert!(message.contains("--lossy-utf8"));
        assert!(message.contains("Invalid UTF-8"));

        assert_eq!(run(&args(&["--lossy-utf8"])).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out.sql");
        let cli = Cli::try_parse_from([
            "breach-import".to_string(),
            format!("--path={}", tmp.path().join("missing").display()),
            "--database=db".to_string(),
            "--table=t".to_string(),
            "--sink=file".to_string(),
            format!("--output={}", out.display()),
            "--format=minimal".to_string(),
        ])
        .unwrap();

        let err = run(&cli).unwrap_err();
        assert!(format!("{:#}", err).contains("Corpus root not found"));
        assert!(!out.exists());
    }
}
