use std::io;

use log::debug;

use crate::{changelog::Changelog, dataset::ChangelogDataset, error::Result, fmt::FormatWriter};

/// Wraps a `std::io::Write` object to write the changelog as JSON, in the
/// same encoding as the published data artifact.
///
/// # Example
///
/// ```
/// # use doclog::{Changelog, ChangelogDataset, fmt::{FormatWriter, JsonWriter}};
/// let mut out = Vec::new();
/// JsonWriter::new(&mut out)
///     .write_changelog(&Changelog::default(), &ChangelogDataset::default())
///     .unwrap();
/// assert_eq!(out, b"[]");
/// ```
pub struct JsonWriter<'a>(&'a mut dyn io::Write);

impl<'a> JsonWriter<'a> {
    /// Creates a new instance of the `JsonWriter` struct using a
    /// `std::io::Write` object.
    pub fn new<T: io::Write>(writer: &'a mut T) -> JsonWriter<'a> { JsonWriter(writer) }
}

impl<'a> FormatWriter for JsonWriter<'a> {
    fn write_changelog(&mut self, _options: &Changelog, dataset: &ChangelogDataset) -> Result<()> {
        debug!("Writing JSON changelog with {} months", dataset.len());
        serde_json::to_writer_pretty(&mut *self.0, dataset)?;
        self.0.flush().map_err(Into::into)
    }
}
