//! Resume journal
//!
//! A small SQLite file that remembers, per import key, how far into the record
//! stream an import got. Because the stream order is deterministic, skipping
//! the recorded number of records on restart resumes at the first batch that
//! was not confirmed by the sink.

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::ImportError;
use crate::sink::Progress;

/// Current journal schema version
pub const JOURNAL_VERSION: i32 = 2;

/// Default journal path (~/.breach-import/journal.db)
pub fn default_journal_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
    PathBuf::from(home)
        .join(".breach-import")
        .join("journal.db")
}

/// Identifies one import: the same corpus into the same table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportKey {
    pub root: String,
    pub database: String,
    pub table: String,
}

impl ImportKey {
    pub fn new(root: &Path, database: impl Into<String>, table: impl Into<String>) -> Self {
        let root = root
            .canonicalize()
            .unwrap_or_else(|_| root.to_path_buf());
        Self {
            root: root.to_string_lossy().to_string(),
            database: database.into(),
            table: table.into(),
        }
    }
}

/// Lifecycle of a journaled import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Running,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Running => "running",
            ImportStatus::Completed => "completed",
            ImportStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "completed" => ImportStatus::Completed,
            "failed" => ImportStatus::Failed,
            _ => ImportStatus::Running,
        }
    }
}

/// Journaled state of one import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Records of the stream already handled (delivered or skipped)
    pub records_consumed: u64,
    pub records_delivered: u64,
    pub batches_delivered: u64,
    pub batches_failed: u64,
    /// Parse settings the offset was counted with
    pub parse_fingerprint: String,
    pub status: ImportStatus,
    pub started_at: String,
    pub updated_at: String,
}

/// Read-write handle on the journal database
pub struct ImportJournal {
    conn: Connection,
    path: Option<PathBuf>,
}

impl ImportJournal {
    /// Open or create the journal at `path`
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        init_schema(&conn)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Journal that lives only as long as the handle
    pub fn open_in_memory() -> Result<Self, ImportError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of imports the journal knows about
    pub fn import_count(&self) -> Result<u64, ImportError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM imports", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn entry(&self, key: &ImportKey) -> Result<Option<JournalEntry>, ImportError> {
        let entry = self
            .conn
            .query_row(
                "SELECT records_consumed, records_delivered, batches_delivered, batches_failed,
                        parse_fingerprint, status, started_at, updated_at
                 FROM imports
                 WHERE root = ?1 AND database_name = ?2 AND table_name = ?3",
                params![key.root, key.database, key.table],
                |row| {
                    let status: String = row.get(5)?;
                    Ok(JournalEntry {
                        records_consumed: row.get::<_, i64>(0)? as u64,
                        records_delivered: row.get::<_, i64>(1)? as u64,
                        batches_delivered: row.get::<_, i64>(2)? as u64,
                        batches_failed: row.get::<_, i64>(3)? as u64,
                        parse_fingerprint: row.get(4)?,
                        status: ImportStatus::parse(&status),
                        started_at: row.get(6)?,
                        updated_at: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Mark an import as running and return the stream offset to resume from.
    ///
    /// Without `resume` any previous state for the key is discarded and the
    /// offset is zero. A journaled offset is only reused when it was counted
    /// with the same `parse_fingerprint`; otherwise the import starts over.
    pub fn start(
        &self,
        key: &ImportKey,
        parse_fingerprint: &str,
        resume: bool,
    ) -> Result<u64, ImportError> {
        let now = chrono::Utc::now().to_rfc3339();

        if resume {
            match self.entry(key)? {
                Some(entry) if entry.parse_fingerprint == parse_fingerprint => {
                    self.conn.execute(
                        "UPDATE imports SET status = ?1, updated_at = ?2
                         WHERE root = ?3 AND database_name = ?4 AND table_name = ?5",
                        params![
                            ImportStatus::Running.as_str(),
                            now,
                            key.root,
                            key.database,
                            key.table
                        ],
                    )?;
                    return Ok(entry.records_consumed);
                }
                Some(entry) => {
                    warn!(
                        root = %key.root,
                        table = %key.table,
                        journaled = %entry.parse_fingerprint,
                        current = %parse_fingerprint,
                        "parse settings changed since the journaled run; starting over"
                    );
                }
                None => {}
            }
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO imports
             (root, database_name, table_name, records_consumed, records_delivered,
              batches_delivered, batches_failed, parse_fingerprint, status, started_at, updated_at)
             VALUES (?1, ?2, ?3, 0, 0, 0, 0, ?4, ?5, ?6, ?6)",
            params![
                key.root,
                key.database,
                key.table,
                parse_fingerprint,
                ImportStatus::Running.as_str(),
                now
            ],
        )?;
        Ok(0)
    }

    /// Advance past one batch, counting it as delivered or failed
    pub fn record_batch(
        &self,
        key: &ImportKey,
        progress: &Progress,
        delivered: bool,
    ) -> Result<(), ImportError> {
        let now = chrono::Utc::now().to_rfc3339();
        let (records, delivered_batches, failed_batches) = if delivered {
            (progress.batch_records as i64, 1, 0)
        } else {
            (0, 0, 1)
        };

        self.conn.execute(
            "UPDATE imports SET
                records_consumed = ?1,
                records_delivered = records_delivered + ?2,
                batches_delivered = batches_delivered + ?3,
                batches_failed = batches_failed + ?4,
                updated_at = ?5
             WHERE root = ?6 AND database_name = ?7 AND table_name = ?8",
            params![
                progress.end_offset() as i64,
                records,
                delivered_batches,
                failed_batches,
                now,
                key.root,
                key.database,
                key.table
            ],
        )?;
        Ok(())
    }

    pub fn finish(&self, key: &ImportKey, status: ImportStatus) -> Result<(), ImportError> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE imports SET status = ?1, updated_at = ?2
             WHERE root = ?3 AND database_name = ?4 AND table_name = ?5",
            params![status.as_str(), now, key.root, key.database, key.table],
        )?;
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> Result<(), ImportError> {
    migrate_schema(conn)?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT
        );
        CREATE TABLE IF NOT EXISTS imports (
            root TEXT NOT NULL,
            database_name TEXT NOT NULL,
            table_name TEXT NOT NULL,
            records_consumed INTEGER NOT NULL DEFAULT 0,
            records_delivered INTEGER NOT NULL DEFAULT 0,
            batches_delivered INTEGER NOT NULL DEFAULT 0,
            batches_failed INTEGER NOT NULL DEFAULT 0,
            parse_fingerprint TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL,
            started_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (root, database_name, table_name)
        );",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('version', ?1)",
        [&JOURNAL_VERSION.to_string()],
    )?;
    Ok(())
}

/// Bring a journal written by an older version up to date
fn migrate_schema(conn: &Connection) -> Result<(), ImportError> {
    let has_metadata: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'metadata'",
        [],
        |row| row.get(0),
    )?;
    if !has_metadata {
        return Ok(());
    }

    let version: Option<i32> = conn
        .query_row(
            "SELECT CAST(value AS INTEGER) FROM metadata WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    // v1 -> v2: offsets are tied to the parse settings they were counted with.
    // Old rows get an empty fingerprint, so they never resume.
    if version == Some(1) {
        conn.execute(
            "ALTER TABLE imports ADD COLUMN parse_fingerprint TEXT NOT NULL DEFAULT ''",
            [],
        )?;
    }
    Ok(())
}
