mod json_writer;
mod md_writer;

use std::{result::Result as StdResult, str::FromStr};

use strum::{Display, EnumString};

pub use self::{json_writer::JsonWriter, md_writer::MarkdownWriter};
use crate::{changelog::Changelog, dataset::ChangelogDataset, error::Result};

/// Shown in place of the month list when there is no history at all.
pub const EMPTY_MESSAGE: &str = "No changelog entries yet.";

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum ChangelogFormat {
    #[default]
    Json,
    Markdown,
}

impl<'de> serde::de::Deserialize<'de> for ChangelogFormat {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A trait that allows writing a changelog page in an arbitrary format. The
/// single required function `write_changelog()` receives the assembled
/// dataset, already ordered newest month first.
///
/// `doclog` provides two implementors of this trait,
/// `doclog::fmt::MarkdownWriter` and `doclog::fmt::JsonWriter`
pub trait FormatWriter {
    fn write_changelog(&mut self, options: &Changelog, dataset: &ChangelogDataset) -> Result<()>;
}
