//! mysql command-line client sink
//!
//! Each statement is piped through the client's stdin, one process per
//! statement. The password travels in `MYSQL_PWD` so it never shows up in the
//! process list.

use breach_core::Statement;
use secrecy::ExposeSecret;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use super::{ExecutionSink, Progress, Target};
use crate::error::SinkError;

/// Delivers statements by running the mysql client
pub struct MysqlClientSink {
    program: PathBuf,
    target: Target,
}

impl MysqlClientSink {
    pub fn new(program: impl Into<PathBuf>, target: Target) -> Self {
        Self {
            program: program.into(),
            target,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--batch");
        if let Some(user) = &self.target.user {
            cmd.arg(format!("--user={}", user));
        }
        if let Some(host) = &self.target.host {
            cmd.arg(format!("--host={}", host));
        }
        if let Some(port) = self.target.port {
            cmd.arg(format!("--port={}", port));
        }
        if let Some(password) = &self.target.password {
            cmd.env("MYSQL_PWD", password.expose_secret());
        }
        cmd.arg(&self.target.database);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl ExecutionSink for MysqlClientSink {
    fn describe(&self) -> String {
        format!("{} {}", self.program.display(), self.target.database)
    }

    fn deliver(&mut self, statement: &Statement, progress: &Progress) -> Result<(), SinkError> {
        let mut child = self.command().spawn().map_err(|source| SinkError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Closing stdin (dropping it) tells the client the script is complete
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin
                .write_all(statement.as_str().as_bytes())
                .and_then(|_| stdin.write_all(b"\n")),
            None => Ok(()),
        };

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(SinkError::ClientFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written?;

        debug!(
            batch = progress.batch_index,
            rows = statement.rows(),
            "statement applied"
        );
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use breach_core::{Batch, Record, StatementBuilder};
    use secrecy::SecretString;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Write an executable stand-in for the mysql client
    fn fake_client(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-mysql");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn statement() -> Statement {
        let batch = Batch::new(vec![Record::from_raw("alice@example.com", "pw'1")]).unwrap();
        StatementBuilder::new("t").unwrap().build(&batch)
    }

    fn progress() -> Progress {
        Progress {
            batch_index: 0,
            stream_offset: 0,
            batch_records: 1,
        }
    }

    #[test]
    fn test_pipes_statement_and_passes_target() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("captured");
        let client = fake_client(
            tmp.path(),
            &format!(
                "echo \"$@\" > {out}.args\necho \"$MYSQL_PWD\" > {out}.pwd\ncat > {out}.sql",
                out = out.display()
            ),
        );

        let target = Target::new("breach")
            .with_user("importer")
            .with_password(SecretString::new("s3cret".to_string()))
            .with_host("db.local")
            .with_port(3307);
        let mut sink = MysqlClientSink::new(&client, target);
        sink.deliver(&statement(), &progress()).unwrap();

        let args = fs::read_to_string(format!("{}.args", out.display())).unwrap();
        assert_eq!(
            args.trim(),
            "--batch --user=importer --host=db.local --port=3307 breach"
        );
        let pwd = fs::read_to_string(format!("{}.pwd", out.display())).unwrap();
        assert_eq!(pwd.trim(), "s3cret");
        let sql = fs::read_to_string(format!("{}.sql", out.display())).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO t(user, pass) VALUES ('alice@example.com','pw\\'1');\n"
        );
    }

    #[test]
    fn test_client_failure_reports_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let client = fake_client(
            tmp.path(),
            "cat > /dev/null\necho 'ERROR 1045 (28000): Access denied' >&2\nexit 1",
        );
        let mut sink = MysqlClientSink::new(&client, Target::new("breach"));

        match sink.deliver(&statement(), &progress()) {
            Err(SinkError::ClientFailed { stderr, status, .. }) => {
                assert_eq!(stderr, "ERROR 1045 (28000): Access denied");
                assert_eq!(status.code(), Some(1));
            }
            other => panic!("expected client failure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_client_is_not_retryable() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = MysqlClientSink::new(tmp.path().join("no-such-client"), Target::new("db"));
        let err = sink.deliver(&statement(), &progress()).unwrap_err();
        assert!(matches!(err, SinkError::Spawn { .. }));
        assert!(!err.is_retryable());
    }
}
