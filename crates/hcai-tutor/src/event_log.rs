//! Append-only CSV session log.
//!
//! One row per recorded turn, columns `timestamp,role,content,explain_mode,topic`.
//! The header is written once, when the file is first created (or found
//! empty), so the file stays parseable across restarts. Each call opens the
//! file in append mode, writes one complete row, and drops the handle before
//! returning.
//!
//! Fields use minimal quoting: a field containing a comma, a double quote, or
//! a line break is wrapped in double quotes with inner quotes doubled. Rows
//! end with `\r\n`. `explain_mode` is written as `True` / `False`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::agent::session::TurnRole;

/// Longest content (in characters) stored per row. Longer content is cut
/// silently.
pub const MAX_LOGGED_CHARS: usize = 800;

/// Column names, in file order.
pub const LOG_COLUMNS: [&str; 5] = ["timestamp", "role", "content", "explain_mode", "topic"];

/// Default location of the session log.
pub const DEFAULT_LOG_PATH: &str = "logs/sessions.csv";

/// Session-log failure.
#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("session log I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session log {} is malformed at row {row}: {reason}", .path.display())]
    Malformed {
        path: PathBuf,
        row: usize,
        reason: String,
    },
}

/// One row of the session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Unix seconds.
    pub timestamp: i64,
    pub role: TurnRole,
    pub content: String,
    pub explain_mode: bool,
    /// Selected mini-lesson, empty when none.
    pub topic: String,
}

impl LogRecord {
    /// Build a record stamped with the current time, truncating `content`.
    pub fn now(role: TurnRole, content: &str, explain_mode: bool, topic: Option<&str>) -> Self {
        Self {
            timestamp: Utc::now().timestamp(),
            role,
            content: truncate_chars(content, MAX_LOGGED_CHARS),
            explain_mode,
            topic: topic.unwrap_or_default().to_string(),
        }
    }

    fn to_csv_row(&self) -> String {
        let fields = [
            self.timestamp.to_string(),
            self.role.as_str().to_string(),
            self.content.clone(),
            python_bool(self.explain_mode).to_string(),
            self.topic.clone(),
        ];
        csv_row(&fields)
    }

    fn from_fields(fields: &[String]) -> Result<Self, String> {
        let [timestamp, role, content, explain_mode, topic] = fields else {
            return Err(format!("expected 5 fields, found {}", fields.len()));
        };
        Ok(Self {
            timestamp: timestamp
                .parse()
                .map_err(|e| format!("bad timestamp '{timestamp}': {e}"))?,
            role: role.parse()?,
            content: content.clone(),
            explain_mode: match explain_mode.as_str() {
                "True" | "true" => true,
                "False" | "false" => false,
                other => return Err(format!("bad explain_mode '{other}'")),
            },
            topic: topic.clone(),
        })
    }
}

/// Appends [`LogRecord`]s to a CSV file.
#[derive(Debug, Clone)]
pub struct EventLogger {
    path: PathBuf,
}

impl EventLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one turn: truncate, stamp, append.
    pub fn log_event(
        &self,
        role: TurnRole,
        content: &str,
        explain_mode: bool,
        topic: Option<&str>,
    ) -> Result<(), EventLogError> {
        self.append(&LogRecord::now(role, content, explain_mode, topic))
    }

    /// Append a prepared record, creating the file (and header) if needed.
    pub fn append(&self, record: &LogRecord) -> Result<(), EventLogError> {
        let io_err = |source| EventLogError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;

        let mut out = String::new();
        if file.metadata().map_err(io_err)?.len() == 0 {
            out.push_str(&csv_row(&LOG_COLUMNS));
        }
        out.push_str(&record.to_csv_row());

        file.write_all(out.as_bytes()).map_err(io_err)?;
        debug!(
            "Logged {} turn to {} ({} chars)",
            record.role,
            self.path.display(),
            record.content.chars().count()
        );
        Ok(())
    }

    /// Read every record back. A missing file is an empty log.
    pub fn read_records(&self) -> Result<Vec<LogRecord>, EventLogError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(EventLogError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut rows = parse_csv(&text).into_iter().enumerate();
        match rows.next() {
            Some((_, header)) if header == LOG_COLUMNS => {}
            Some((_, header)) => {
                return Err(EventLogError::Malformed {
                    path: self.path.clone(),
                    row: 0,
                    reason: format!("unexpected header {header:?}"),
                });
            }
            None => return Ok(Vec::new()),
        }

        rows.map(|(row, fields)| {
            LogRecord::from_fields(&fields).map_err(|reason| EventLogError::Malformed {
                path: self.path.clone(),
                row,
                reason,
            })
        })
        .collect()
    }
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text.get(..idx).unwrap_or(text).to_string(),
        None => text.to_string(),
    }
}

fn python_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut row = fields
        .iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

/// Split CSV text into rows of fields, honouring quoted line breaks.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger_in(dir: &tempfile::TempDir) -> EventLogger {
        EventLogger::new(dir.path().join("logs").join("sessions.csv"))
    }

    #[test]
    fn first_write_creates_dir_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let logger = logger_in(&dir);

        logger
            .log_event(TurnRole::User, "What is fairness in ML?", false, None)
            .unwrap();

        let text = std::fs::read_to_string(logger.path()).unwrap();
        let mut lines = text.split("\r\n");
        assert_eq!(lines.next(), Some("timestamp,role,content,explain_mode,topic"));
        let row = lines.next().unwrap();
        assert!(row.ends_with(",user,What is fairness in ML?,False,"), "{row}");
    }

    #[test]
    fn header_written_exactly_once_across_loggers() {
        let dir = tempfile::tempdir().unwrap();
        logger_in(&dir)
            .log_event(TurnRole::User, "one", true, Some("Fairness 101"))
            .unwrap();
        // A fresh logger on the same path models a process restart.
        let logger = logger_in(&dir);
        logger
            .log_event(TurnRole::Assistant, "two", true, Some("Fairness 101"))
            .unwrap();

        let text = std::fs::read_to_string(logger.path()).unwrap();
        assert_eq!(text.matches("timestamp,role").count(), 1);

        let records = logger.read_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content, "one");
        assert_eq!(records[1].role, TurnRole::Assistant);
        assert!(records[1].explain_mode);
        assert_eq!(records[1].topic, "Fairness 101");
    }

    #[test]
    fn long_content_keeps_first_800_chars() {
        let dir = tempfile::tempdir().unwrap();
        let logger = logger_in(&dir);
        let content: String = "é".repeat(MAX_LOGGED_CHARS) + "TAIL";

        logger
            .log_event(TurnRole::Assistant, &content, false, None)
            .unwrap();

        let records = logger.read_records().unwrap();
        assert_eq!(records[0].content.chars().count(), MAX_LOGGED_CHARS);
        assert!(records[0].content.chars().all(|c| c == 'é'));
    }

    #[test]
    fn commas_quotes_and_newlines_survive() {
        let dir = tempfile::tempdir().unwrap();
        let logger = logger_in(&dir);
        let content = "Bias, \"fairness\"\nand\r\naccountability";

        logger.log_event(TurnRole::User, content, false, None).unwrap();

        let raw = std::fs::read_to_string(logger.path()).unwrap();
        assert!(raw.contains("\"Bias, \"\"fairness\"\"\nand\r\naccountability\""));
        assert_eq!(logger.read_records().unwrap()[0].content, content);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(logger_in(&dir).read_records().unwrap().is_empty());
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // The log path is an existing directory, so opening it for append fails.
        let logger = EventLogger::new(dir.path());

        let err = logger
            .log_event(TurnRole::User, "hello", false, None)
            .unwrap_err();
        assert!(matches!(err, EventLogError::Io { .. }));
    }

    #[test]
    fn truncate_chars_handles_short_and_exact() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcde", 5), "abcde");
        assert_eq!(truncate_chars("abcdef", 5), "abcde");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn parse_csv_handles_empty_trailing_field() {
        let rows = parse_csv("a,b,\r\n1,,\r\n");
        assert_eq!(rows, vec![vec!["a", "b", ""], vec!["1", "", ""]]);
    }
}
