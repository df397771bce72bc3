//! Monthly changelog data for a documentation site.
//!
//! The pipeline reads the git history of the docs directory, splits it into
//! commit records, buckets them by month and publishes the resulting list,
//! newest month first, as a JSON artifact behind a `changelog` page route.
//!
//! ```
//! # use doclog::Changelog;
//! let build = Changelog::default().build_with(
//!     "h1\x002024-01-15\x00Fix routing bug\x00\n\
//!      h2\x002024-01-02\x00Update docs\x00\n\
//!      h3\x002023-12-20\x00Initial commit\x00\n",
//! );
//! let titles: Vec<_> = build.dataset.iter().map(|e| e.title.as_str()).collect();
//! assert_eq!(titles, ["January 2024", "December 2023"]);
//! ```

mod changelog;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fmt;
pub mod git;
mod link_style;
mod monthmap;
pub mod publish;
mod record;

pub use changelog::{Build, Changelog};
pub use dataset::{ChangelogAssembler, ChangelogDataset, MonthlyEntry};
pub use git::{Extraction, GitLog, HistoryExtractor, HistoryQuery, RawLog};
pub use link_style::{short_hash, LinkStyle};
pub use monthmap::{MonthBuckets, MonthKey, MonthlyGrouper};
pub use publish::{FsSite, Publisher, Route, Site};
pub use record::{CommitRecord, Parsed, RecordParser};

// The default config file
const DEFAULT_CONFIG_FILE: &str = ".changelog.toml";
