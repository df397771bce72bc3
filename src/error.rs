use std::{io, path::PathBuf, process::ExitStatus, result::Result as StdResult, time::Duration};

use thiserror::Error;

pub type Result<T> = StdResult<T, Error>;

/// An enum for describing and handling various errors encountered while
/// extracting history, loading configuration, or publishing a changelog.
///
/// Only configuration and publication errors are ever returned to the caller
/// as failures. Extraction problems are reported as the `warning` of an
/// [`Extraction`](crate::git::Extraction) and degrade to an empty changelog.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to parse config file {}: {}", .0.display(), .1)]
    ConfigParse(PathBuf, #[source] toml::de::Error),

    #[error("missing [changelog] table in config file: {}", .0.display())]
    ConfigFormat(PathBuf),

    #[error("cannot get current directory")]
    CurrentDir,

    #[error("field delimiter {0:?} must be an ASCII control character other than newline")]
    Delimiter(char),

    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("failed to run git")]
    GitSpawn(#[source] io::Error),

    #[error("git log exited with {status}: {stderr}")]
    GitFailed { status: ExitStatus, stderr: String },

    #[error("git log did not finish within {0:?}")]
    GitTimeout(Duration),

    #[error("git log output truncated to {0} bytes")]
    Truncated(usize),

    #[error("fatal I/O error while writing changelog output")]
    Io(#[from] io::Error),

    #[error("failed to serialize changelog data")]
    Json(#[from] serde_json::Error),

    #[error("route already registered: {0}")]
    DuplicateRoute(String),
}
