use std::io;

use log::debug;

use crate::{
    changelog::Changelog,
    dataset::{ChangelogDataset, MonthlyEntry},
    error::Result,
    fmt::{FormatWriter, EMPTY_MESSAGE},
    link_style::short_hash,
};

/// Wraps a `std::io::Write` object to write the changelog page in Markdown
///
/// # Example
///
/// ```no_run
/// # use std::fs::File;
/// # use doclog::{Changelog, fmt::MarkdownWriter};
/// let changelog = Changelog::new().unwrap();
/// let build = changelog.build();
///
/// let mut file = File::create("changelog.md").ok().unwrap();
/// let mut writer = MarkdownWriter::new(&mut file);
///
/// changelog.write_page_with(&mut writer, &build.dataset).unwrap();
/// ```
pub struct MarkdownWriter<'a>(&'a mut dyn io::Write);

impl<'a> MarkdownWriter<'a> {
    /// Creates a new instance of the `MarkdownWriter` struct using a
    /// `std::io::Write` object.
    pub fn new<T: io::Write + 'a>(writer: &'a mut T) -> MarkdownWriter<'a> {
        MarkdownWriter(writer)
    }

    /// Writes one month: a heading, then one bullet per commit
    fn write_entry(&mut self, options: &Changelog, entry: &MonthlyEntry) -> Result<()> {
        writeln!(self.0, "<a name=\"{}\"></a>", entry.id)?;
        writeln!(self.0, "## {}\n", entry.title)?;

        let repo = options.repo.as_deref().unwrap_or("");
        for commit in &entry.commits {
            let link = options.link_style.commit_link(commit.hash.as_str(), repo);
            let short = short_hash(&commit.hash);
            if link == short {
                writeln!(self.0, "- {} ({}) - {}", commit.subject, short, commit.date)?;
            } else {
                writeln!(
                    self.0,
                    "- {} ([{}]({})) - {}",
                    commit.subject, short, link, commit.date
                )?;
            }
        }
        writeln!(self.0).map_err(Into::into)
    }
}

impl<'a> FormatWriter for MarkdownWriter<'a> {
    fn write_changelog(&mut self, options: &Changelog, dataset: &ChangelogDataset) -> Result<()> {
        debug!("Writing Markdown changelog");
        writeln!(self.0, "# Changelog\n")?;

        if dataset.is_empty() {
            debug!("No entries, writing placeholder");
            writeln!(self.0, "{EMPTY_MESSAGE}")?;
        }
        for entry in dataset {
            debug!("Writing month: {}", entry.id);
            self.write_entry(options, entry)?;
        }

        self.0.flush().map_err(Into::into)
    }
}
