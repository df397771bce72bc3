use std::{
    io::{self, Read},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use log::{debug, warn};

use crate::{
    error::{Error, Result},
    record::DEFAULT_DELIMITER,
};

/// Largest `git log` output kept in memory, in bytes.
pub const DEFAULT_MAX_BUFFER: usize = 10 * 1024 * 1024;

/// How long `git log` may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Raw output of a history query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLog {
    /// One commit per line, fields separated by the delimiter
    pub text: String,
    /// Whether output was cut at the size limit
    pub truncated: bool,
}

impl RawLog {
    pub fn complete<S: Into<String>>(text: S) -> RawLog {
        RawLog {
            text: text.into(),
            truncated: false,
        }
    }
}

/// A source of raw commit history for a path scope.
///
/// [`GitLog`] asks a real repository; tests can hand back a fixed string.
pub trait HistoryQuery {
    fn run(&self, scope: &Path) -> Result<RawLog>;
}

impl HistoryQuery for str {
    fn run(&self, _scope: &Path) -> Result<RawLog> { Ok(RawLog::complete(self)) }
}

impl HistoryQuery for String {
    fn run(&self, _scope: &Path) -> Result<RawLog> { Ok(RawLog::complete(self.as_str())) }
}

impl<Q: HistoryQuery + ?Sized> HistoryQuery for &Q {
    fn run(&self, scope: &Path) -> Result<RawLog> { (**self).run(scope) }
}

/// Runs `git log` in a working tree.
#[derive(Debug, Clone)]
pub struct GitLog {
    /// The working tree to query
    pub work_tree: PathBuf,
    /// Field delimiter placed between hash, date, subject and body
    pub delimiter: char,
    pub max_buffer: usize,
    pub timeout: Duration,
}

impl GitLog {
    pub fn new<P: AsRef<Path>>(work_tree: P) -> GitLog {
        GitLog {
            work_tree: work_tree.as_ref().to_path_buf(),
            delimiter: DEFAULT_DELIMITER,
            max_buffer: DEFAULT_MAX_BUFFER,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The `--format` argument: hash, short date, subject and body joined by
    /// the delimiter, written as a `%xNN` placeholder.
    pub fn format(&self) -> String {
        let d = format!("%x{:02x}", u32::from(self.delimiter));
        format!("%H{d}%ad{d}%s{d}%b")
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.work_tree);
        cmd
    }

    /// Checks whether the working tree belongs to a git repository. The check
    /// is bounded by the same timeout as the log query.
    pub fn is_repository(&self) -> Result<bool> {
        let mut child = self
            .git()
            .args(["rev-parse", "--is-inside-work-tree"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(Error::GitSpawn)?;

        let status = self.wait(&mut child)?;
        let mut answer = String::new();
        if let Some(mut out) = child.stdout.take() {
            out.read_to_string(&mut answer)?;
        }
        Ok(status.success() && answer.trim() == "true")
    }

    fn wait(&self, child: &mut Child) -> Result<std::process::ExitStatus> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if start.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::GitTimeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl HistoryQuery for GitLog {
    fn run(&self, scope: &Path) -> Result<RawLog> {
        if !self.is_repository()? {
            return Err(Error::NotARepository(self.work_tree.clone()));
        }

        let format = format!("--format={}", self.format());
        debug!(
            "Running git log {} -- {:?} in {:?}",
            format, scope, self.work_tree
        );
        let mut child = self
            .git()
            .args(["log", "--date=short", &format, "--"])
            .arg(scope)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(Error::GitSpawn)?;

        let limit = self.max_buffer;
        let stdout = child.stdout.take().map(|out| {
            thread::spawn(move || -> io::Result<(Vec<u8>, bool)> {
                let mut buf = Vec::new();
                let mut capped = out.take(limit as u64);
                capped.read_to_end(&mut buf)?;
                // Drain the rest so git never blocks on a full pipe
                let rest = io::copy(&mut capped.into_inner(), &mut io::sink())?;
                Ok((buf, rest > 0))
            })
        });
        let stderr = child.stderr.take().map(|mut err| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = err.read_to_string(&mut buf);
                buf
            })
        });

        let status = self.wait(&mut child)?;

        let (mut bytes, truncated) = match stdout {
            Some(handle) => handle
                .join()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "stdout reader panicked"))??,
            None => (Vec::new(), false),
        };
        if !status.success() {
            let stderr = stderr.and_then(|h| h.join().ok()).unwrap_or_default();
            return Err(Error::GitFailed {
                status,
                stderr: stderr.trim().to_owned(),
            });
        }

        if truncated {
            // Drop the partial last line
            let end = bytes.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
            bytes.truncate(end);
        }
        Ok(RawLog {
            text: String::from_utf8_lossy(&bytes).into_owned(),
            truncated,
        })
    }
}

/// What the extractor produced. `raw` is empty whenever history could not be
/// read, and `warning` says why.
#[derive(Debug, Default)]
pub struct Extraction {
    pub raw: String,
    pub warning: Option<Error>,
}

/// Pulls raw history out of a [`HistoryQuery`] without ever failing the
/// build.
pub struct HistoryExtractor<Q> {
    query: Q,
    scope: PathBuf,
}

impl<Q: HistoryQuery> HistoryExtractor<Q> {
    pub fn new<P: AsRef<Path>>(query: Q, scope: P) -> Self {
        HistoryExtractor {
            query,
            scope: scope.as_ref().to_path_buf(),
        }
    }

    /// Runs the query. Failures are logged and turned into an empty
    /// extraction; truncated output is kept with a warning.
    pub fn extract(&self) -> Extraction {
        match self.query.run(&self.scope) {
            Ok(RawLog {
                text,
                truncated: false,
            }) => {
                debug!("Extracted {} bytes of history", text.len());
                Extraction {
                    raw: text,
                    warning: None,
                }
            }
            Ok(RawLog {
                text,
                truncated: true,
            }) => {
                let warning = Error::Truncated(text.len());
                warn!("{warning}, changelog may be incomplete");
                Extraction {
                    raw: text,
                    warning: Some(warning),
                }
            }
            Err(e) => {
                warn!("Could not read commit history, changelog will be empty: {e}");
                Extraction {
                    raw: String::new(),
                    warning: Some(e),
                }
            }
        }
    }
}
