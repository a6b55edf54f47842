//! Corpus discovery: every regular file under the root, in a fixed order
//!
//! Entries are visited depth-first and siblings are sorted by file name, so
//! the file order (and with it the record order) is the same on every run.
//! Neither the file list nor the records are ever collected up front.

use breach_core::{FileRecords, ParseOptions, ParseStats, Record};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ImportError;

/// A validated corpus root
#[derive(Debug, Clone)]
pub struct CorpusWalker {
    root: PathBuf,
}

impl CorpusWalker {
    /// Check that `root` exists and is a directory. Nothing is read yet.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ImportError> {
        let root = root.into();
        let metadata = match std::fs::metadata(&root) {
            Ok(m) => m,
            Err(_) => return Err(ImportError::RootNotFound(root)),
        };
        if !metadata.is_dir() {
            return Err(ImportError::NotADirectory(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily enumerate regular files
    pub fn files(&self) -> CorpusFiles {
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();
        CorpusFiles {
            walker,
            failed: false,
        }
    }

    /// One continuous record stream over all files
    pub fn records(&self, options: ParseOptions) -> CorpusRecords {
        CorpusRecords {
            files: self.files(),
            current: None,
            options,
            stats: CorpusStats::default(),
            failed: false,
        }
    }
}

/// Iterator over the corpus' regular files. Fused after the first error.
pub struct CorpusFiles {
    walker: walkdir::IntoIter,
    failed: bool,
}

impl Iterator for CorpusFiles {
    type Item = Result<PathBuf, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        for entry in self.walker.by_ref() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => return Some(Ok(entry.into_path())),
                Ok(_) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(ImportError::Walk(e)));
                }
            }
        }
        None
    }
}

/// Counters for a corpus scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub files: u64,
    #[serde(flatten)]
    pub lines: ParseStats,
}

/// Records of every corpus file, concatenated in walk order.
///
/// At most one file is open at a time; it is closed as soon as it is
/// exhausted or fails.
pub struct CorpusRecords {
    files: CorpusFiles,
    current: Option<FileRecords>,
    options: ParseOptions,
    stats: CorpusStats,
    failed: bool,
}

impl CorpusRecords {
    /// Counters so far, including the file currently being read
    pub fn stats(&self) -> CorpusStats {
        let mut stats = self.stats;
        if let Some(file) = &self.current {
            stats.lines.merge(file.stats());
        }
        stats
    }

    fn close_current(&mut self) {
        if let Some(file) = self.current.take() {
            self.stats.lines.merge(file.stats());
            debug!(
                file = %file.source().display(),
                records = file.stats().records,
                dropped = file.stats().dropped(),
                "finished file"
            );
        }
    }

    fn fail(&mut self, err: ImportError) -> Option<Result<Record, ImportError>> {
        self.close_current();
        self.failed = true;
        Some(Err(err))
    }
}

impl Iterator for CorpusRecords {
    type Item = Result<Record, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }

            if let Some(file) = self.current.as_mut() {
                match file.next() {
                    Some(Ok(record)) => return Some(Ok(record)),
                    Some(Err(e)) => return self.fail(e.into()),
                    None => self.close_current(),
                }
            }

            match self.files.next()? {
                Ok(path) => match FileRecords::open(&path, self.options.clone()) {
                    Ok(file) => {
                        debug!(file = %path.display(), "scanning file");
                        self.stats.files += 1;
                        self.current = Some(file);
                    }
                    Err(e) => return self.fail(e.into()),
                },
                Err(e) => return self.fail(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn corpus() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("b/nested")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("a.txt"), "alice@example.com:pw1\nnotanemail:pw2\n").unwrap();
        fs::write(root.join("b/0.txt"), "carol@example.com:pw4\n").unwrap();
        fs::write(root.join("b/nested/z.txt"), "dave@example.com|pw5\n").unwrap();
        fs::write(root.join("c.txt"), "bob@test.org;pw3").unwrap();
        tmp
    }

    #[test]
    fn test_missing_root_fails_fast() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            CorpusWalker::new(&missing),
            Err(ImportError::RootNotFound(p)) if p == missing
        ));
    }

    #[test]
    fn test_file_root_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            CorpusWalker::new(&file),
            Err(ImportError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_files_in_sorted_depth_first_order() {
        let tmp = corpus();
        let walker = CorpusWalker::new(tmp.path()).unwrap();
        let files: Vec<PathBuf> = walker
            .files()
            .map(|f| f.unwrap().strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b/0.txt"),
                PathBuf::from("b/nested/z.txt"),
                PathBuf::from("c.txt"),
            ]
        );
    }

    #[test]
    fn test_records_concatenate_in_order() {
        let tmp = corpus();
        let walker = CorpusWalker::new(tmp.path()).unwrap();
        let mut records = walker.records(ParseOptions::default());
        let identifiers: Vec<String> = records
            .by_ref()
            .map(|r| r.unwrap().identifier().to_string())
            .collect();

        assert_eq!(
            identifiers,
            vec![
                "alice@example.com",
                "carol@example.com",
                "dave@example.com",
                "bob@test.org",
            ]
        );

        let stats = records.stats();
        assert_eq!(stats.files, 4);
        assert_eq!(stats.lines.lines, 5);
        assert_eq!(stats.lines.records, 4);
        assert_eq!(stats.lines.invalid_identifier, 1);
    }

    #[test]
    fn test_empty_root_has_no_records() {
        let tmp = tempfile::tempdir().unwrap();
        let walker = CorpusWalker::new(tmp.path()).unwrap();
        assert_eq!(walker.records(ParseOptions::default()).count(), 0);
    }

    #[test]
    fn test_bad_file_aborts_stream() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "a@x.io:1\n").unwrap();
        fs::write(tmp.path().join("b.txt"), b"b@x.io:\xff\n".as_slice()).unwrap();
        fs::write(tmp.path().join("c.txt"), "c@x.io:3\n").unwrap();

        let walker = CorpusWalker::new(tmp.path()).unwrap();
        let results: Vec<_> = walker.records(ParseOptions::default()).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ImportError::Core(breach_core::CoreError::Encoding { .. }))
        ));
    }

    #[test]
    fn test_unopenable_file_aborts_stream() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "a@x.io:1\na@x.io:2\n").unwrap();
        fs::write(tmp.path().join("b.txt"), "b@x.io:3\n").unwrap();
        fs::write(tmp.path().join("c.txt"), "c@x.io:4\n").unwrap();

        let walker = CorpusWalker::new(tmp.path()).unwrap();
        let mut records = walker.records(ParseOptions::default());
        assert!(records.next().unwrap().is_ok());

        // The directory listing is already taken, so b.txt is still visited
        fs::remove_file(tmp.path().join("b.txt")).unwrap();

        assert!(records.next().unwrap().is_ok());
        match records.next() {
            Some(Err(ImportError::Core(breach_core::CoreError::Open { path, .. }))) => {
                assert_eq!(path, tmp.path().join("b.txt"));
            }
            other => panic!("expected open failure, got {:?}", other),
        }
        assert!(records.next().is_none());

        let stats = records.stats();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.lines.records, 2);
    }
}
