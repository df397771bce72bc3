use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date};

use crate::error::{Error, Result};

/// The field delimiter requested from `git log` unless configured otherwise.
pub const DEFAULT_DELIMITER: char = '\0';

static DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"));

time::serde::format_description!(iso_day, Date, "[year]-[month]-[day]");

/// One commit of the documentation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// The full commit hash
    pub hash: String,
    /// The commit date, day precision
    #[serde(with = "iso_day")]
    pub date: Date,
    /// The commit subject line
    pub subject: String,
    /// The commit body, empty when the commit has none
    #[serde(default)]
    pub body: String,
}

/// The result of parsing a raw log buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parsed {
    /// Well-formed records, in input order
    pub records: Vec<CommitRecord>,
    /// Number of record lines discarded as malformed
    pub dropped: usize,
}

/// Splits `git log` output into commit records.
///
/// Each line holds up to four fields separated by the delimiter: hash, date,
/// subject and body. The body may continue on the following lines. Lines
/// lacking a hash, a valid date or a subject are skipped and only counted in
/// [`Parsed::dropped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordParser {
    delimiter: char,
}

impl Default for RecordParser {
    fn default() -> Self {
        RecordParser {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl RecordParser {
    /// Creates a parser splitting fields on `delimiter`, which must be an
    /// ASCII control character other than a line break.
    ///
    /// # Example
    ///
    /// ```
    /// # use doclog::RecordParser;
    /// assert!(RecordParser::new('\x1f').is_ok());
    /// assert!(RecordParser::new('|').is_err());
    /// ```
    pub fn new(delimiter: char) -> Result<Self> {
        if !delimiter.is_ascii_control() || delimiter == '\n' || delimiter == '\r' {
            return Err(Error::Delimiter(delimiter));
        }
        Ok(RecordParser { delimiter })
    }

    /// The field delimiter this parser splits on.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Parses every line of `raw`, preserving input order.
    ///
    /// A line without the delimiter continues the body of the record above
    /// it. Continuation lines of a dropped record are skipped with it, and
    /// only lines that cannot belong to any record count as dropped.
    ///
    /// # Example
    ///
    /// ```
    /// # use doclog::RecordParser;
    /// let parsed = RecordParser::default().parse("abc\x002024-01-15\x00Fix typo\x00\nbroken\x002024-01-16\n");
    /// assert_eq!(parsed.records.len(), 1);
    /// assert_eq!(parsed.dropped, 1);
    /// ```
    pub fn parse(&self, raw: &str) -> Parsed {
        let mut parsed = Parsed::default();
        // Outcome of the last line holding the delimiter
        let mut last_ok = None;
        for line in raw.lines() {
            if !line.contains(self.delimiter) {
                match (last_ok, parsed.records.last_mut()) {
                    (Some(true), Some(record)) => {
                        if !record.body.is_empty() {
                            record.body.push('\n');
                        }
                        record.body.push_str(line);
                    }
                    (None, _) if !line.trim().is_empty() => parsed.dropped += 1,
                    _ => {}
                }
                continue;
            }
            match self.parse_line(line) {
                Some(record) => {
                    parsed.records.push(record);
                    last_ok = Some(true);
                }
                None => {
                    parsed.dropped += 1;
                    last_ok = Some(false);
                }
            }
        }
        for record in &mut parsed.records {
            let len = record.body.trim_end().len();
            record.body.truncate(len);
        }
        debug!(
            "Parsed {} commit records, dropped {} malformed lines",
            parsed.records.len(),
            parsed.dropped
        );
        parsed
    }

    /// Parses a single log line, returning `None` when a required field is
    /// missing.
    pub fn parse_line(&self, line: &str) -> Option<CommitRecord> {
        let mut fields = line.splitn(4, self.delimiter).map(str::trim);

        let hash = fields.next().filter(|f| !f.is_empty())?;
        let date = fields.next().and_then(parse_day)?;
        let subject = fields.next().filter(|f| !f.is_empty())?;
        let body = fields.next().unwrap_or_default();

        Some(CommitRecord {
            hash: hash.to_owned(),
            date,
            subject: subject.to_owned(),
            body: body.to_owned(),
        })
    }
}

fn parse_day(field: &str) -> Option<Date> {
    if !DAY_RE.is_match(field) {
        return None;
    }
    Date::parse(field, format_description!("[year]-[month]-[day]")).ok()
}
