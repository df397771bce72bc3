use std::fmt;

use indexmap::IndexMap;
use log::debug;
use time::{Date, Duration};

use crate::record::CommitRecord;

/// A `YYYY-MM` key identifying one calendar month.
///
/// The key is the ISO day string of a date with its `-DD` suffix cut off, so
/// it never depends on locale or time zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    text: String,
    month: u8,
    first_day: Date,
}

impl MonthKey {
    pub fn of(date: Date) -> MonthKey {
        let mut text = date.to_string();
        text.truncate(text.len() - 3);
        MonthKey {
            text,
            month: u8::from(date.month()),
            first_day: date - Duration::days(i64::from(date.day()) - 1),
        }
    }

    pub fn as_str(&self) -> &str { &self.text }

    /// The year part of the key, four digits for any common era date.
    pub fn year(&self) -> &str { &self.text[..self.text.len() - 3] }

    /// The month of the key, from 1 to 12.
    pub fn month(&self) -> u8 { self.month }

    /// The first day of the month.
    pub fn first_day(&self) -> Date { self.first_day }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.text) }
}

/// Month key -> commits of that month, in order of arrival
pub type MonthBuckets = IndexMap<MonthKey, Vec<CommitRecord>>;

/// Buckets commit records by calendar month.
pub struct MonthlyGrouper;

impl MonthlyGrouper {
    /// Groups `records` by [`MonthKey`]. Every record lands in exactly one
    /// bucket and each bucket keeps the order records were given in.
    ///
    /// # Example
    ///
    /// ```
    /// # use doclog::{MonthlyGrouper, RecordParser};
    /// let parsed = RecordParser::default().parse("a\x002024-01-15\x00one\nb\x002023-12-01\x00two\n");
    /// let buckets = MonthlyGrouper::group(parsed.records);
    /// assert_eq!(buckets.len(), 2);
    /// ```
    pub fn group(records: Vec<CommitRecord>) -> MonthBuckets {
        let mut buckets = MonthBuckets::new();
        for record in records {
            buckets
                .entry(MonthKey::of(record.date))
                .or_insert_with(Vec::new)
                .push(record);
        }
        debug!("Grouped commits into {} months", buckets.len());
        buckets
    }
}
