//! Line-oriented credential parsing
//!
//! A line is split on the first delimiter into identifier and secret. Lines
//! without two non-empty parts, or whose identifier is not an address, are
//! dropped without error. Files are read once, one line at a time.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::address::is_valid_address;
use crate::errors::CoreError;
use crate::types::Record;

/// Delimiters used when none are configured
pub const DEFAULT_DELIMITERS: &str = ":;|";

/// Set of characters that may separate identifier from secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters(Vec<char>);

impl Delimiters {
    /// Build a delimiter set from the characters of `set`
    pub fn parse(set: &str) -> Result<Self, CoreError> {
        let mut chars: Vec<char> = Vec::new();
        for c in set.chars() {
            if !chars.contains(&c) {
                chars.push(c);
            }
        }
        if chars.is_empty() {
            return Err(CoreError::NoDelimiters);
        }
        Ok(Self(chars))
    }

    pub fn contains(&self, c: char) -> bool {
        self.0.contains(&c)
    }

    pub fn as_slice(&self) -> &[char] {
        &self.0
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self(DEFAULT_DELIMITERS.chars().collect())
    }
}

/// How lines are decoded and split
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub delimiters: Delimiters,
    /// Replace invalid UTF-8 instead of failing the run
    pub lossy_utf8: bool,
}

impl ParseOptions {
    /// Stable description of everything that shapes the record stream.
    ///
    /// Two scans of the same corpus yield the same records in the same order
    /// only if their fingerprints match.
    pub fn fingerprint(&self) -> String {
        let delimiters: String = self.delimiters.as_slice().iter().collect();
        format!("delimiters={:?} lossy_utf8={}", delimiters, self.lossy_utf8)
    }
}

/// Per-file or aggregated line counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub lines: u64,
    pub records: u64,
    pub malformed: u64,
    pub invalid_identifier: u64,
}

impl ParseStats {
    pub fn merge(&mut self, other: &ParseStats) {
        self.lines += other.lines;
        self.records += other.records;
        self.malformed += other.malformed;
        self.invalid_identifier += other.invalid_identifier;
    }

    /// Lines that produced no record
    pub fn dropped(&self) -> u64 {
        self.malformed + self.invalid_identifier
    }
}

/// What a single line turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Record(Record),
    /// Fewer than two non-empty parts
    Malformed,
    /// Two parts, but the identifier is not an address
    InvalidIdentifier,
}

/// Split `line` at the first delimiter. Both halves must be non-empty.
pub fn split_line<'a>(line: &'a str, delimiters: &Delimiters) -> Option<(&'a str, &'a str)> {
    let (at, delim) = line.char_indices().find(|(_, c)| delimiters.contains(*c))?;
    let identifier = &line[..at];
    let secret = &line[at + delim.len_utf8()..];
    if identifier.is_empty() || secret.is_empty() {
        return None;
    }
    Some((identifier, secret))
}

/// Split, validate and escape one line
pub fn parse_line(line: &str, delimiters: &Delimiters) -> LineOutcome {
    match split_line(line, delimiters) {
        None => LineOutcome::Malformed,
        Some((identifier, _)) if !is_valid_address(identifier) => LineOutcome::InvalidIdentifier,
        Some((identifier, secret)) => LineOutcome::Record(Record::from_raw(identifier, secret)),
    }
}

/// Lazy record iterator over any buffered reader.
///
/// Holds a single line buffer. After the first error the iterator is fused.
pub struct LineRecords<R> {
    reader: R,
    source: PathBuf,
    options: ParseOptions,
    buf: Vec<u8>,
    line_number: u64,
    stats: ParseStats,
    done: bool,
}

/// Record iterator over an open file; the handle closes when it is dropped
pub type FileRecords = LineRecords<BufReader<File>>;

impl FileRecords {
    /// Open a file for a single top-to-bottom scan
    pub fn open(path: &Path, options: ParseOptions) -> Result<Self, CoreError> {
        let file = File::open(path).map_err(|source| CoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(LineRecords::new(BufReader::new(file), path, options))
    }
}

impl<R: BufRead> LineRecords<R> {
    /// Wrap a reader; `source` is only used in errors and logs
    pub fn new(reader: R, source: impl Into<PathBuf>, options: ParseOptions) -> Self {
        Self {
            reader,
            source: source.into(),
            options,
            buf: Vec::new(),
            line_number: 0,
            stats: ParseStats::default(),
            done: false,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    fn fail(&mut self, err: CoreError) -> Option<Result<Record, CoreError>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for LineRecords<R> {
    type Item = Result<Record, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(source) => {
                    let err = CoreError::Read {
                        path: self.source.clone(),
                        line: self.line_number + 1,
                        source,
                    };
                    return self.fail(err);
                }
            }

            self.line_number += 1;
            self.stats.lines += 1;

            let mut bytes: &[u8] = &self.buf;
            if let Some(rest) = bytes.strip_suffix(b"\n") {
                bytes = rest;
            }
            if let Some(rest) = bytes.strip_suffix(b"\r") {
                bytes = rest;
            }

            let line: Cow<'_, str> = if self.options.lossy_utf8 {
                String::from_utf8_lossy(bytes)
            } else {
                match std::str::from_utf8(bytes) {
                    Ok(s) => Cow::Borrowed(s),
                    Err(_) => {
                        let err = CoreError::Encoding {
                            path: self.source.clone(),
                            line: self.line_number,
                        };
                        return self.fail(err);
                    }
                }
            };

            match parse_line(&line, &self.options.delimiters) {
                LineOutcome::Record(record) => {
                    self.stats.records += 1;
                    return Some(Ok(record));
                }
                LineOutcome::Malformed => {
                    self.stats.malformed += 1;
                    trace!(source = %self.source.display(), line = self.line_number, "dropped malformed line");
                }
                LineOutcome::InvalidIdentifier => {
                    self.stats.invalid_identifier += 1;
                    trace!(source = %self.source.display(), line = self.line_number, "dropped line with invalid identifier");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn records_from(content: &[u8], options: ParseOptions) -> LineRecords<Cursor<Vec<u8>>> {
        LineRecords::new(Cursor::new(content.to_vec()), "mem.txt", options)
    }

    #[test]
    fn test_split_on_first_delimiter() {
        let d = Delimiters::default();
        assert_eq!(split_line("a@b.io:pw", &d), Some(("a@b.io", "pw")));
        assert_eq!(split_line("a@b.io;pw:with;more", &d), Some(("a@b.io", "pw:with;more")));
        assert_eq!(split_line("a@b.io|pw", &d), Some(("a@b.io", "pw")));
    }

    #[test]
    fn test_split_requires_two_non_empty_parts() {
        let d = Delimiters::default();
        assert_eq!(split_line("no delimiter here", &d), None);
        assert_eq!(split_line("a@b.io:", &d), None);
        assert_eq!(split_line(":pw", &d), None);
        assert_eq!(split_line("", &d), None);
    }

    #[test]
    fn test_custom_delimiters() {
        let d = Delimiters::parse(":").unwrap();
        assert_eq!(split_line("a@b.io|pw", &d), None);
        assert_eq!(split_line("a@b.io:p|w", &d), Some(("a@b.io", "p|w")));
        assert!(matches!(Delimiters::parse(""), Err(CoreError::NoDelimiters)));
        assert_eq!(Delimiters::parse("::;").unwrap().as_slice(), &[':', ';']);
    }

    #[test]
    fn test_fingerprint_tracks_stream_settings() {
        let default = ParseOptions::default();
        assert_eq!(default.fingerprint(), ParseOptions::default().fingerprint());

        let colon_only = ParseOptions {
            delimiters: Delimiters::parse(":").unwrap(),
            ..Default::default()
        };
        let lossy = ParseOptions {
            lossy_utf8: true,
            ..Default::default()
        };
        assert_ne!(default.fingerprint(), colon_only.fingerprint());
        assert_ne!(default.fingerprint(), lossy.fingerprint());
    }

    #[test]
    fn test_parse_line_outcomes() {
        let d = Delimiters::default();
        assert_eq!(
            parse_line("alice@example.com:pw1", &d),
            LineOutcome::Record(Record::from_raw("alice@example.com", "pw1"))
        );
        assert_eq!(parse_line("notanemail:pw2", &d), LineOutcome::InvalidIdentifier);
        assert_eq!(parse_line("alice@example.com", &d), LineOutcome::Malformed);
    }

    #[test]
    fn test_parsed_fields_are_escaped() {
        let d = Delimiters::default();
        match parse_line("o'hara@example.com:p'w_1%", &d) {
            LineOutcome::Record(r) => {
                assert_eq!(r.identifier(), "o\\'hara@example.com");
                assert_eq!(r.secret(), "p\\'w\\_1\\%");
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_iterator_skips_bad_lines_and_counts() {
        let content = b"alice@example.com:pw1\nnotanemail:pw2\n\njunk\r\nbob@test.org;pw3\r\n";
        let mut it = records_from(content, ParseOptions::default());
        let records: Vec<Record> = it.by_ref().map(|r| r.unwrap()).collect();

        assert_eq!(
            records,
            vec![
                Record::from_raw("alice@example.com", "pw1"),
                Record::from_raw("bob@test.org", "pw3"),
            ]
        );
        assert_eq!(
            *it.stats(),
            ParseStats {
                lines: 5,
                records: 2,
                malformed: 2,
                invalid_identifier: 1,
            }
        );
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut it = records_from(b"a@b.io:x\nc@d.io:y", ParseOptions::default());
        assert_eq!(it.next().unwrap().unwrap(), Record::from_raw("a@b.io", "x"));
        assert_eq!(it.next().unwrap().unwrap(), Record::from_raw("c@d.io", "y"));
        assert!(it.next().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_fatal_by_default() {
        let mut it = records_from(b"a@b.io:ok\nc@d.io:\xff\xfe\ne@f.io:never\n", ParseOptions::default());
        assert!(it.next().unwrap().is_ok());
        match it.next() {
            Some(Err(CoreError::Encoding { line, .. })) => assert_eq!(line, 2),
            other => panic!("expected encoding error, got {:?}", other),
        }
        assert!(it.next().is_none());
    }

    #[test]
    fn test_lossy_utf8_replaces_bytes() {
        let options = ParseOptions {
            lossy_utf8: true,
            ..Default::default()
        };
        let records: Vec<Record> = records_from(b"c@d.io:p\xffw\n", options)
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(records, vec![Record::from_raw("c@d.io", "p\u{fffd}w")]);
    }

    #[test]
    fn test_open_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dump.txt");
        std::fs::write(&path, "alice@example.com:pw1\n").unwrap();

        let records: Vec<_> = FileRecords::open(&path, ParseOptions::default())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);

        let missing = FileRecords::open(&tmp.path().join("missing.txt"), ParseOptions::default());
        assert!(matches!(missing, Err(CoreError::Open { .. })));
    }
}
